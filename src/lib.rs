pub mod date_util;
pub mod diary;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod records;
pub mod report;
pub mod risk;
pub mod streak;
pub mod trend;
pub mod window;

pub use error::{Error, Result};
pub use loader::{RecordLoader, Snapshot, SnapshotLoader};
pub use metrics::MetricsSnapshot;
pub use report::{AnalysisReport, SnapshotSet};
pub use risk::{RiskAssessment, RiskFlag, RiskInputs, RiskLevel, RiskThresholds};
pub use trend::{PercentChange, Trend};
pub use window::{MonthWindow, WindowSet};

use chrono::NaiveDate;

/// Run-wide configuration. Passed in explicitly so the engine stays a pure
/// function of its arguments; nothing reads ambient state.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Fallback monthly target when the backend has none for the cast.
    pub default_target_earnings: i64,
    /// Confirmed transactions at or below which a scheduled day counts low.
    pub low_booking_cutoff: u64,
    pub risk: RiskThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            default_target_earnings: 300_000,
            low_booking_cutoff: 2,
            risk: RiskThresholds::default(),
        }
    }
}

/// Main entry point: the per-cast monthly analytics and retention-risk run.
///
/// Stateless between invocations. Every call takes a fixed snapshot of
/// inputs through the loader and recomputes the whole report; a new cast or
/// month selection simply supersedes the previous run.
pub struct CastAnalyzer<L> {
    loader: L,
    config: AnalysisConfig,
}

impl<L: RecordLoader> CastAnalyzer<L> {
    pub fn new(loader: L) -> Self {
        CastAnalyzer {
            loader,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(loader: L, config: AnalysisConfig) -> Self {
        CastAnalyzer { loader, config }
    }

    /// Analyze as of today. The CLI entry point.
    pub fn analyze(
        &self,
        cast_id: &str,
        cast_name: &str,
        month_label: &str,
    ) -> Result<AnalysisReport> {
        self.analyze_at(
            cast_id,
            cast_name,
            month_label,
            chrono::Local::now().date_naive(),
        )
    }

    /// Analyze with an explicit evaluation date for the staleness gap.
    pub fn analyze_at(
        &self,
        cast_id: &str,
        cast_name: &str,
        month_label: &str,
        as_of: NaiveDate,
    ) -> Result<AnalysisReport> {
        let cast_id = cast_id.trim();
        if cast_id.is_empty() {
            return Err(Error::InvalidIdentifier("cast id must not be blank".into()));
        }
        let windows = WindowSet::resolve(month_label)?;

        // Full transaction history through the window end: the new-customer
        // rule needs first-ever visits, which may predate every window.
        let history =
            self.loader
                .fetch_transactions(cast_id, None, windows.current.last_day())?;
        let attendance_current = self.fetch_attendance(cast_id, &windows.current)?;
        let attendance_previous = self.fetch_attendance(cast_id, &windows.previous)?;
        let attendance_two_back = self.fetch_attendance(cast_id, &windows.two_back)?;

        let current = metrics::aggregate(&attendance_current, &history, &windows.current);
        let previous = metrics::aggregate(&attendance_previous, &history, &windows.previous);
        let two_back = metrics::aggregate(&attendance_two_back, &history, &windows.two_back);

        let vs_previous = trend::snapshot_trends(&current, &previous);
        let vs_two_back = trend::snapshot_trends(&current, &two_back);

        let worked_day_series = [
            two_back.schedule.worked_days,
            previous.schedule.worked_days,
            current.schedule.worked_days,
        ];
        let decline_run = streak::longest_run(streak::decline_flags(&worked_day_series));
        let low_booking_run = streak::longest_run(streak::low_booking_flags(
            &attendance_current,
            &history,
            &windows.current,
            self.config.low_booking_cutoff,
        ));
        let absence_run =
            streak::longest_run(streak::absence_flags(&attendance_current, &windows.current));
        let last_worked = attendance_current
            .iter()
            .filter(|a| a.status.is_scheduled())
            .map(|a| a.date)
            .max();

        let posts = self.loader.fetch_diary_posts(
            cast_name,
            windows.current.first_day(),
            windows.current.last_day(),
        )?;
        let diary_posts = diary::posts_by(&posts, cast_name, &windows.current);

        let target_earnings = self
            .loader
            .fetch_target_earnings(cast_id, &windows.current.label())?
            .unwrap_or(self.config.default_target_earnings);
        let notes = self.loader.fetch_case_notes(cast_id)?;
        let meetings = self.loader.fetch_meetings(cast_id)?;
        let met_this_window = meetings
            .iter()
            .any(|m| windows.current.contains(m.date));

        let inputs = RiskInputs {
            worked_day_series,
            decline_run,
            working_rate: current.schedule.working_rate,
            payout: current.sales.total_payout,
            prior_payout: previous.sales.total_payout,
            target_earnings,
            worked_days: current.schedule.worked_days,
            absence_days: current.schedule.absence_days,
            absence_run,
            last_worked,
            as_of,
            window_start: windows.current.first_day(),
            low_booking_run,
            cancellation_rate: current.cancellations.rate,
            diary_posts,
            latest_note: notes.first().map(|n| n.text.clone()),
            met_this_window,
        };
        let risk = risk::classify(inputs, &self.config.risk);

        Ok(AnalysisReport {
            cast_id: cast_id.to_string(),
            month: windows.current.label(),
            snapshots: SnapshotSet {
                current,
                previous,
                two_back,
            },
            vs_previous,
            vs_two_back,
            risk,
        })
    }

    fn fetch_attendance(
        &self,
        cast_id: &str,
        window: &MonthWindow,
    ) -> Result<Vec<records::AttendanceRecord>> {
        self.loader
            .fetch_attendance(cast_id, window.first_day(), window.last_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        serde_json::from_str(
            r#"{
            "attendance": [
                {"cast_id": "c-01", "date": "2026-07-03", "status": "worked",
                 "shift_start": "18:00", "shift_end": "23:00"},
                {"cast_id": "c-01", "date": "2026-07-04", "status": "worked",
                 "shift_start": "18:00", "shift_end": "23:00"},
                {"cast_id": "c-01", "date": "2026-07-05", "status": "absent"},
                {"cast_id": "c-01", "date": "2026-06-10", "status": "worked",
                 "shift_start": "18:00", "shift_end": "23:00"}
            ],
            "transactions": [
                {"cast_id": "c-01", "customer_id": "k-old",
                 "occurred_at": "2026-05-10T20:00:00", "price": 12000, "payout": 6000,
                 "disposition": "confirmed"},
                {"cast_id": "c-01", "customer_id": "k-old",
                 "occurred_at": "2026-07-03T20:00:00", "price": 12000, "payout": 6000,
                 "disposition": "confirmed", "service_start": "20:00", "service_end": "21:30"},
                {"cast_id": "c-01", "customer_id": "k-new",
                 "occurred_at": "2026-07-04T20:00:00", "price": 18000, "payout": 9000,
                 "disposition": "confirmed", "addons": ["aroma", "hotstone"], "addon_total": 3000},
                {"cast_id": "c-01", "customer_id": "k-gone",
                 "occurred_at": "2026-07-04T22:00:00", "price": 14000, "payout": 7000,
                 "disposition": "cancelled"}
            ],
            "diary_posts": [
                {"author": " Yuki ", "date": "2026-07-04"},
                {"author": "Aoi", "date": "2026-07-04"}
            ],
            "case_notes": [
                {"cast_id": "c-01", "date": "2026-07-01", "text": "thinking about quitting"}
            ],
            "meetings": [
                {"cast_id": "c-01", "date": "2026-06-20"}
            ],
            "targets": [
                {"cast_id": "c-01", "month": "2026-07", "amount": 300000}
            ]
        }"#,
        )
        .unwrap()
    }

    fn analyzer() -> CastAnalyzer<SnapshotLoader> {
        CastAnalyzer::new(SnapshotLoader::new(snapshot()))
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()
    }

    #[test]
    fn blank_cast_id_is_rejected() {
        let err = analyzer().analyze_at("  ", "Yuki", "2026-07", as_of());
        assert!(matches!(err, Err(Error::InvalidIdentifier(_))));
    }

    #[test]
    fn bad_month_label_is_rejected() {
        let err = analyzer().analyze_at("c-01", "Yuki", "2026/07", as_of());
        assert!(matches!(err, Err(Error::MonthParse(_))));
    }

    #[test]
    fn full_run_counts_new_versus_returning_customers() {
        let report = analyzer()
            .analyze_at("c-01", "Yuki", "2026-07", as_of())
            .unwrap();
        let customers = &report.snapshots.current.customers;
        // k-old first visited in May: volume yes, new no. k-gone cancelled.
        assert_eq!(customers.new_customers, 1);
        assert_eq!(customers.new_customer_ids, vec!["k-new"]);
        assert_eq!(report.snapshots.current.sales.service_count, 2);
    }

    #[test]
    fn full_run_assembles_evidence_for_risk() {
        let report = analyzer()
            .analyze_at("c-01", "Yuki", "2026-07", as_of())
            .unwrap();
        let inputs = &report.risk.inputs;
        assert_eq!(inputs.worked_day_series, [0, 1, 2]);
        assert_eq!(inputs.diary_posts, 1);
        assert!(!inputs.met_this_window);
        assert_eq!(
            inputs.last_worked,
            NaiveDate::from_ymd_opt(2026, 7, 4)
        );
        assert_eq!(inputs.target_earnings, 300_000);
        assert_eq!(inputs.latest_note.as_deref(), Some("thinking about quitting"));

        let note_flag = report
            .risk
            .flags
            .iter()
            .find(|f| f.name == "negative_note")
            .unwrap();
        assert!(note_flag.triggered);
    }

    #[test]
    fn addon_split_flows_through_to_the_report() {
        let report = analyzer()
            .analyze_at("c-01", "Yuki", "2026-07", as_of())
            .unwrap();
        let addons = &report.snapshots.current.categories.addons;
        assert_eq!(addons["aroma"].revenue, 1500.0);
        assert_eq!(addons["hotstone"].revenue, 1500.0);
    }

    #[test]
    fn empty_prior_months_compare_without_dividing() {
        let report = analyzer()
            .analyze_at("c-01", "Yuki", "2026-07", as_of())
            .unwrap();
        // May had no attendance at all; June had no transactions.
        assert_eq!(
            report.vs_two_back["worked_days"].percent,
            PercentChange::Infinite
        );
        assert_eq!(
            report.vs_previous["service_count"].percent,
            PercentChange::Infinite
        );
        // May did see one booking, so payout compares finitely two back.
        assert_eq!(
            report.vs_two_back["total_payout"].percent,
            PercentChange::Finite(150.0)
        );
    }

    #[test]
    fn report_renders_and_serializes() {
        let report = analyzer()
            .analyze_at("c-01", "Yuki", "2026-07", as_of())
            .unwrap();
        let md = report::render_markdown(&report);
        assert!(md.contains("Cast c-01 — 2026-07"));
        assert!(serde_json::to_string(&report).is_ok());
    }
}
