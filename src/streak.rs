use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::records::{AttendanceRecord, AttendanceStatus, TransactionRecord};
use crate::window::MonthWindow;

/// Longest run of consecutive `true` values; any `false` resets the run.
pub fn longest_run<I>(flags: I) -> usize
where
    I: IntoIterator<Item = bool>,
{
    let mut longest = 0;
    let mut current = 0;
    for flag in flags {
        if flag {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Pairwise declines over an oldest-first series: flag i is true when point
/// i+1 fell below point i. A 3-point monthly series yields two flags, so a
/// run of 2 means two consecutive month-over-month declines.
pub fn decline_flags(series: &[u64]) -> Vec<bool> {
    series.windows(2).map(|pair| pair[1] < pair[0]).collect()
}

/// Low-booking flags over the window's scheduled days, chronological.
///
/// Only dates carrying a worked/late/early-leave record enter the sequence;
/// absent and unrecorded days are skipped outright, neither breaking nor
/// extending a run. A day flags true when its non-cancelled transactions
/// number at most `cutoff`.
pub fn low_booking_flags(
    attendance: &[AttendanceRecord],
    transactions: &[TransactionRecord],
    window: &MonthWindow,
    cutoff: u64,
) -> Vec<bool> {
    let scheduled_dates: BTreeSet<NaiveDate> = attendance
        .iter()
        .filter(|a| window.contains(a.date) && a.status.is_scheduled())
        .map(|a| a.date)
        .collect();

    let mut bookings: HashMap<NaiveDate, u64> = HashMap::new();
    for t in transactions
        .iter()
        .filter(|t| window.contains(t.date()) && !t.disposition.is_cancelled())
    {
        *bookings.entry(t.date()).or_insert(0) += 1;
    }

    scheduled_dates
        .iter()
        .map(|date| bookings.get(date).copied().unwrap_or(0) <= cutoff)
        .collect()
}

/// Absence flags day-per-day over the window's calendar dates. A date flags
/// true only when some record that day is absent; recorded non-absent days
/// and unrecorded days both break the run.
pub fn absence_flags(attendance: &[AttendanceRecord], window: &MonthWindow) -> Vec<bool> {
    let absent_dates: BTreeSet<NaiveDate> = attendance
        .iter()
        .filter(|a| window.contains(a.date) && a.status == AttendanceStatus::Absent)
        .map(|a| a.date)
        .collect();

    window.days().map(|d| absent_dates.contains(&d)).collect()
}
