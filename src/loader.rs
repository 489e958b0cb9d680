use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Result;
use crate::records::{AttendanceRecord, CaseNote, DiaryPost, Meeting, TransactionRecord};

/// The data-backend seam. The hosted store fetches asynchronously upstream of
/// this engine; by the time a loader is handed over, every sequence is
/// resolved, so the trait is synchronous by contract.
pub trait RecordLoader {
    fn fetch_attendance(
        &self,
        cast_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>>;

    /// `since: None` means from the beginning of the cast's history. The
    /// analyzer relies on that to anchor first-ever customer visits.
    fn fetch_transactions(
        &self,
        cast_id: &str,
        since: Option<NaiveDate>,
        until: NaiveDate,
    ) -> Result<Vec<TransactionRecord>>;

    /// Posts whose free-text author matches the filter. Implementations may
    /// treat the filter as a query hint; attribution is re-checked exactly
    /// on the engine side.
    fn fetch_diary_posts(
        &self,
        author: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DiaryPost>>;

    /// Monthly target earnings, if one was set for this cast and month.
    fn fetch_target_earnings(&self, cast_id: &str, month: &str) -> Result<Option<i64>>;

    /// Newest first.
    fn fetch_case_notes(&self, cast_id: &str) -> Result<Vec<CaseNote>>;

    fn fetch_meetings(&self, cast_id: &str) -> Result<Vec<Meeting>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotNote {
    pub cast_id: String,
    pub date: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotMeeting {
    pub cast_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotTarget {
    pub cast_id: String,
    pub month: String,
    pub amount: i64,
}

/// One exported backend snapshot: every record type in flat lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub diary_posts: Vec<DiaryPost>,
    #[serde(default)]
    pub case_notes: Vec<SnapshotNote>,
    #[serde(default)]
    pub meetings: Vec<SnapshotMeeting>,
    #[serde(default)]
    pub targets: Vec<SnapshotTarget>,
}

/// A `RecordLoader` over a single JSON snapshot file. Backs the CLI and the
/// end-to-end tests without reintroducing the hosted backend.
pub struct SnapshotLoader {
    snapshot: Snapshot,
}

impl SnapshotLoader {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotLoader { snapshot }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        log::info!(
            "loaded snapshot {}: {} attendance, {} transactions",
            path.display(),
            snapshot.attendance.len(),
            snapshot.transactions.len()
        );
        Ok(SnapshotLoader { snapshot })
    }
}

impl RecordLoader for SnapshotLoader {
    fn fetch_attendance(
        &self,
        cast_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        Ok(self
            .snapshot
            .attendance
            .iter()
            .filter(|a| a.cast_id == cast_id && a.date >= from && a.date <= to)
            .cloned()
            .collect())
    }

    fn fetch_transactions(
        &self,
        cast_id: &str,
        since: Option<NaiveDate>,
        until: NaiveDate,
    ) -> Result<Vec<TransactionRecord>> {
        Ok(self
            .snapshot
            .transactions
            .iter()
            .filter(|t| {
                t.cast_id == cast_id
                    && t.date() <= until
                    && since.map_or(true, |s| t.date() >= s)
            })
            .cloned()
            .collect())
    }

    fn fetch_diary_posts(
        &self,
        author: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DiaryPost>> {
        let author = author.trim();
        Ok(self
            .snapshot
            .diary_posts
            .iter()
            .filter(|p| p.author.trim() == author && p.date >= from && p.date <= to)
            .cloned()
            .collect())
    }

    fn fetch_target_earnings(&self, cast_id: &str, month: &str) -> Result<Option<i64>> {
        Ok(self
            .snapshot
            .targets
            .iter()
            .find(|t| t.cast_id == cast_id && t.month == month)
            .map(|t| t.amount))
    }

    fn fetch_case_notes(&self, cast_id: &str) -> Result<Vec<CaseNote>> {
        let mut notes: Vec<CaseNote> = self
            .snapshot
            .case_notes
            .iter()
            .filter(|n| n.cast_id == cast_id)
            .map(|n| CaseNote {
                date: n.date,
                text: n.text.clone(),
            })
            .collect();
        notes.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(notes)
    }

    fn fetch_meetings(&self, cast_id: &str) -> Result<Vec<Meeting>> {
        Ok(self
            .snapshot
            .meetings
            .iter()
            .filter(|m| m.cast_id == cast_id)
            .map(|m| Meeting { date: m.date })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "attendance": [
            {"cast_id": "c-01", "date": "2026-07-03", "status": "worked",
             "shift_start": "18:00", "shift_end": "23:00"},
            {"cast_id": "c-02", "date": "2026-07-03", "status": "worked"}
        ],
        "transactions": [
            {"cast_id": "c-01", "customer_id": "k-1",
             "occurred_at": "2026-07-03T21:00:00", "price": 18000, "payout": 9000,
             "disposition": "confirmed"},
            {"cast_id": "c-01", "customer_id": "k-2",
             "occurred_at": "2026-05-10T21:00:00", "price": 12000, "payout": 6000}
        ],
        "diary_posts": [
            {"author": "Yuki", "date": "2026-07-04"}
        ],
        "case_notes": [
            {"cast_id": "c-01", "date": "2026-06-01", "text": "older note"},
            {"cast_id": "c-01", "date": "2026-07-10", "text": "newer note"}
        ],
        "meetings": [
            {"cast_id": "c-01", "date": "2026-07-15"}
        ],
        "targets": [
            {"cast_id": "c-01", "month": "2026-07", "amount": 280000}
        ]
    }"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loader() -> SnapshotLoader {
        SnapshotLoader::new(serde_json::from_str(SNAPSHOT).unwrap())
    }

    #[test]
    fn attendance_filters_by_cast_and_range() {
        let recs = loader()
            .fetch_attendance("c-01", date(2026, 7, 1), date(2026, 7, 31))
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].shift_start.as_deref(), Some("18:00"));

        let none = loader()
            .fetch_attendance("c-01", date(2026, 8, 1), date(2026, 8, 31))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn transactions_with_open_start_reach_history() {
        let all = loader()
            .fetch_transactions("c-01", None, date(2026, 7, 31))
            .unwrap();
        assert_eq!(all.len(), 2);

        let windowed = loader()
            .fetch_transactions("c-01", Some(date(2026, 7, 1)), date(2026, 7, 31))
            .unwrap();
        assert_eq!(windowed.len(), 1);
    }

    #[test]
    fn diary_posts_filter_by_author_and_range() {
        let posts = loader()
            .fetch_diary_posts("Yuki", date(2026, 7, 1), date(2026, 7, 31))
            .unwrap();
        assert_eq!(posts.len(), 1);

        let none = loader()
            .fetch_diary_posts("Aoi", date(2026, 7, 1), date(2026, 7, 31))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn case_notes_come_back_newest_first() {
        let notes = loader().fetch_case_notes("c-01").unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].text, "newer note");
    }

    #[test]
    fn target_lookup_is_per_month() {
        let l = loader();
        assert_eq!(
            l.fetch_target_earnings("c-01", "2026-07").unwrap(),
            Some(280000)
        );
        assert_eq!(l.fetch_target_earnings("c-01", "2026-06").unwrap(), None);
        assert_eq!(l.fetch_target_earnings("c-09", "2026-07").unwrap(), None);
    }

    #[test]
    fn open_reads_a_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        let loader = SnapshotLoader::open(file.path()).unwrap();
        let meetings = loader.fetch_meetings("c-01").unwrap();
        assert_eq!(meetings.len(), 1);
    }

    #[test]
    fn open_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(SnapshotLoader::open(file.path()).is_err());
    }
}
