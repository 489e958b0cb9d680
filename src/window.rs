use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::date_util::last_day_of_month;
use crate::error::{Error, Result};

static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// One calendar month used as an aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
}

impl MonthWindow {
    /// Parse a "YYYY-MM" month label.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let month: u32 = caps[2].parse().unwrap();
            if (1..=12).contains(&month) {
                return Ok(MonthWindow { year, month });
            }
        }
        Err(Error::MonthParse(format!("expected YYYY-MM, got {s:?}")))
    }

    /// Canonical "YYYY-MM" label.
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    pub fn last_day(&self) -> NaiveDate {
        last_day_of_month(self.year, self.month)
    }

    /// Inclusive [start, end] date range.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.last_day())
    }

    /// The month before this one, rolling the year at January.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            MonthWindow {
                year: self.year - 1,
                month: 12,
            }
        } else {
            MonthWindow {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.date_range();
        date >= start && date <= end
    }

    /// Calendar dates of the window in chronological order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let (start, end) = self.date_range();
        start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The three rolling windows an analysis run spans.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WindowSet {
    pub current: MonthWindow,
    pub previous: MonthWindow,
    pub two_back: MonthWindow,
}

impl WindowSet {
    /// Resolve a reference month label into current / previous / two-back.
    pub fn resolve(month_label: &str) -> Result<Self> {
        let current = MonthWindow::parse(month_label)?;
        let previous = current.previous();
        let two_back = previous.previous();
        Ok(WindowSet {
            current,
            previous,
            two_back,
        })
    }

    /// Windows oldest first, the order the decline scan consumes them.
    pub fn chronological(&self) -> [MonthWindow; 3] {
        [self.two_back, self.previous, self.current]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(
            MonthWindow::parse("2026-07").unwrap(),
            MonthWindow {
                year: 2026,
                month: 7
            }
        );
        assert_eq!(
            MonthWindow::parse("2025-12").unwrap(),
            MonthWindow {
                year: 2025,
                month: 12
            }
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(MonthWindow::parse("garbage").is_err());
        assert!(MonthWindow::parse("2026-13").is_err());
        assert!(MonthWindow::parse("2026-00").is_err());
        assert!(MonthWindow::parse("2026-7").is_err());
        assert!(MonthWindow::parse("26-07").is_err());
    }

    #[test]
    fn test_date_range_respects_month_length() {
        let (s, e) = MonthWindow::parse("2026-02").unwrap().date_range();
        assert_eq!(s, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(e, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());

        let (_, e) = MonthWindow::parse("2024-02").unwrap().date_range();
        assert_eq!(e, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_previous_rolls_year() {
        let jan = MonthWindow::parse("2026-01").unwrap();
        assert_eq!(jan.previous().label(), "2025-12");
        assert_eq!(jan.previous().previous().label(), "2025-11");
    }

    #[test]
    fn test_resolve_window_set() {
        let set = WindowSet::resolve("2026-02").unwrap();
        assert_eq!(set.current.label(), "2026-02");
        assert_eq!(set.previous.label(), "2026-01");
        assert_eq!(set.two_back.label(), "2025-12");
    }

    #[test]
    fn test_days_iterates_whole_month() {
        let w = MonthWindow::parse("2026-07").unwrap();
        let days: Vec<NaiveDate> = w.days().collect();
        assert_eq!(days.len(), 31);
        assert_eq!(days[0], w.first_day());
        assert_eq!(days[30], w.last_day());
    }

    #[test]
    fn test_contains() {
        let w = MonthWindow::parse("2026-07").unwrap();
        assert!(w.contains(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()));
        assert!(w.contains(NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()));
        assert!(!w.contains(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()));
    }
}
