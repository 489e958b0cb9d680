use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

static RE_HHMM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

/// Minutes in one service day. Overnight spans wrap by this amount.
pub const DAY_MINUTES: u32 = 24 * 60;

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap() - Duration::days(1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap() - Duration::days(1)
    }
}

/// Parse an "HH:MM" wall-clock string into minutes since midnight.
///
/// Purely lexical: hours × 60 + minutes, no range normalization. Attendance
/// data is frequently incomplete, so malformed or missing input yields 0
/// instead of an error.
pub fn to_minutes(text: &str) -> u32 {
    let text = text.trim();
    let Some(caps) = RE_HHMM.captures(text) else {
        if !text.is_empty() {
            log::warn!("unparseable time of day {text:?}, treating as 00:00");
        }
        return 0;
    };
    let hours: u32 = caps[1].parse().unwrap();
    let minutes: u32 = caps[2].parse().unwrap();
    hours * 60 + minutes
}

/// Duration in minutes between two times of day on the same service day.
///
/// An end numerically ≤ the start means the range crosses midnight (a close
/// time of "00:00" reads as hour 24 of the open day), so a day is added
/// before taking the difference. Every shift, service, and grid span in the
/// crate goes through this one function.
pub fn span_minutes(start: u32, end: u32) -> u32 {
    let end = if end <= start { end + DAY_MINUTES } else { end };
    end - start
}

/// Span between two optional "HH:MM" strings; `None` (or unparseable input
/// on either side) contributes nothing.
pub fn span_between(start: Option<&str>, end: Option<&str>) -> u32 {
    match (start, end) {
        (Some(s), Some(e)) => span_minutes(to_minutes(s), to_minutes(e)),
        _ => 0,
    }
}
