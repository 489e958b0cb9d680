use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::metrics::{MetricsSnapshot, NONE_BUCKET};
use crate::risk::RiskAssessment;
use crate::trend::Trend;

/// The three snapshots behind one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSet {
    pub current: MetricsSnapshot,
    pub previous: MetricsSnapshot,
    pub two_back: MetricsSnapshot,
}

/// Everything the presentation layer consumes for one cast × month: plain
/// data, no behavior, no loader references.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub cast_id: String,
    pub month: String,
    pub snapshots: SnapshotSet,
    pub vs_previous: BTreeMap<String, Trend>,
    pub vs_two_back: BTreeMap<String, Trend>,
    pub risk: RiskAssessment,
}

/// Render an analysis report as markdown.
pub fn render_markdown(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let current = &report.snapshots.current;

    let _ = writeln!(out, "# Cast Analysis Report");
    let _ = writeln!(out, "Cast {} — {}", report.cast_id, report.month);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Month in Numbers");
    let _ = writeln!(
        out,
        "- Worked days: {} ({} absences)",
        current.schedule.worked_days, current.schedule.absence_days
    );
    let _ = writeln!(
        out,
        "- Working rate: {:.1}% ({} of {} scheduled minutes)",
        current.schedule.working_rate,
        current.schedule.minutes_worked,
        current.schedule.minutes_scheduled
    );
    let _ = writeln!(
        out,
        "- Services: {} (gross ¥{}, payout ¥{}, average ticket ¥{:.0})",
        current.sales.service_count,
        current.sales.gross_sales,
        current.sales.total_payout,
        current.sales.average_ticket
    );
    let _ = writeln!(
        out,
        "- Customers: {} new, {} of them repeated",
        current.customers.new_customers, current.customers.repeat_customers
    );
    let _ = writeln!(
        out,
        "- Cancellations: {} (¥{} lost, rate {:.1}%)",
        current.cancellations.cancelled_count,
        current.cancellations.lost_revenue,
        current.cancellations.rate
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "## Movement");
    write_trends(&mut out, "vs previous month", &report.vs_previous);
    write_trends(&mut out, "vs two months back", &report.vs_two_back);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Add-on Mix");
    if current.categories.addons.is_empty() {
        let _ = writeln!(out, "No transactions recorded for this window.");
    } else {
        for (label, stat) in &current.categories.addons {
            // NONE_BUCKET is not a partition of the others; a transaction
            // with N add-ons appears once per add-on.
            let label = if label == NONE_BUCKET {
                "no add-on"
            } else {
                label.as_str()
            };
            let _ = writeln!(
                out,
                "- {}: {} transactions (¥{:.0})",
                label, stat.count, stat.revenue
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Retention Risk");
    let _ = writeln!(
        out,
        "Level: **{}** ({} of {} signals)",
        report.risk.level.as_str(),
        report.risk.true_count,
        report.risk.flags.len()
    );
    for flag in &report.risk.flags {
        let mark = if flag.triggered { "x" } else { " " };
        let _ = writeln!(out, "- [{mark}] {} — {}", flag.name, flag.detail);
    }

    out
}

fn write_trends(out: &mut String, heading: &str, trends: &BTreeMap<String, Trend>) {
    let _ = writeln!(out, "### {heading}");
    if trends.is_empty() {
        let _ = writeln!(out, "No prior window to compare.");
        return;
    }
    for (name, trend) in trends {
        let _ = writeln!(out, "- {}: {:+.1} ({})", name, trend.delta, trend.percent);
    }
}
