pub mod types;

pub use types::*;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;

use crate::date_util::span_between;
use crate::records::{AttendanceRecord, AttendanceStatus, TransactionRecord};
use crate::window::MonthWindow;

/// Aggregate one cast's attendance and transactions into a window snapshot.
///
/// `transactions` is the cast's history up to the window end, not just the
/// window slice: the new-customer rule needs to see whether a customer's
/// first-ever visit predates the window. Service aggregates filter to the
/// window internally.
pub fn aggregate(
    attendance: &[AttendanceRecord],
    transactions: &[TransactionRecord],
    window: &MonthWindow,
) -> MetricsSnapshot {
    let in_window: Vec<&TransactionRecord> = transactions
        .iter()
        .filter(|t| window.contains(t.date()))
        .collect();
    let (cancelled, service): (Vec<&TransactionRecord>, Vec<&TransactionRecord>) = in_window
        .into_iter()
        .partition(|t| t.disposition.is_cancelled());

    let schedule = schedule_metrics(attendance, &service, window);
    let sales = sales_metrics(&service);
    let customers = customer_metrics(transactions, &service, window);
    let cancellations = cancellation_metrics(&service, &cancelled);
    let categories = category_breakdown(&service);

    log::debug!(
        "aggregated {}: {} service / {} cancelled transactions, {} worked days",
        window,
        service.len(),
        cancelled.len(),
        schedule.worked_days
    );

    MetricsSnapshot {
        window: window.label(),
        schedule,
        sales,
        customers,
        cancellations,
        categories,
    }
}

fn schedule_metrics(
    attendance: &[AttendanceRecord],
    service: &[&TransactionRecord],
    window: &MonthWindow,
) -> ScheduleMetrics {
    // Distinct dates: duplicate records for one date must not inflate the
    // day counts.
    let mut worked_dates = BTreeSet::new();
    let mut absence_dates = BTreeSet::new();
    let mut minutes_scheduled: u64 = 0;

    for rec in attendance.iter().filter(|a| window.contains(a.date)) {
        if rec.status.is_scheduled() {
            worked_dates.insert(rec.date);
            minutes_scheduled +=
                span_between(rec.shift_start.as_deref(), rec.shift_end.as_deref()) as u64;
        } else if rec.status == AttendanceStatus::Absent {
            absence_dates.insert(rec.date);
        }
    }

    let minutes_worked: u64 = service
        .iter()
        .map(|t| span_between(t.service_start.as_deref(), t.service_end.as_deref()) as u64)
        .sum();

    ScheduleMetrics {
        worked_days: worked_dates.len() as u64,
        absence_days: absence_dates.len() as u64,
        minutes_worked,
        minutes_scheduled,
        working_rate: pct(minutes_worked as f64, minutes_scheduled as f64),
    }
}

fn sales_metrics(service: &[&TransactionRecord]) -> SalesMetrics {
    let gross_sales: i64 = service.iter().map(|t| t.price).sum();
    let total_payout: i64 = service.iter().map(|t| t.payout).sum();
    let count = service.len() as u64;
    SalesMetrics {
        service_count: count,
        gross_sales,
        total_payout,
        average_ticket: ratio(gross_sales as f64, count as f64),
    }
}

fn customer_metrics(
    history: &[TransactionRecord],
    service: &[&TransactionRecord],
    window: &MonthWindow,
) -> CustomerMetrics {
    // Earliest non-cancelled visit per customer across the full history.
    let mut first_visit: HashMap<&str, NaiveDateTime> = HashMap::new();
    for t in history
        .iter()
        .filter(|t| !t.disposition.is_cancelled())
    {
        let Some(customer) = t.customer_id.as_deref() else {
            continue;
        };
        first_visit
            .entry(customer)
            .and_modify(|at| {
                if t.occurred_at < *at {
                    *at = t.occurred_at;
                }
            })
            .or_insert(t.occurred_at);
    }

    let mut window_visits: BTreeMap<&str, u64> = BTreeMap::new();
    for t in service {
        if let Some(customer) = t.customer_id.as_deref() {
            *window_visits.entry(customer).or_insert(0) += 1;
        }
    }

    let mut new_customer_ids = Vec::new();
    let mut repeat_customers = 0;
    for (customer, visits) in &window_visits {
        let is_new = first_visit
            .get(customer)
            .is_some_and(|at| window.contains(at.date()));
        if is_new {
            new_customer_ids.push((*customer).to_string());
            if *visits >= 2 {
                repeat_customers += 1;
            }
        }
    }

    CustomerMetrics {
        new_customers: new_customer_ids.len() as u64,
        repeat_customers,
        new_customer_ids,
    }
}

fn cancellation_metrics(
    service: &[&TransactionRecord],
    cancelled: &[&TransactionRecord],
) -> CancellationMetrics {
    let cancelled_count = cancelled.len() as u64;
    let lost_revenue: i64 = cancelled.iter().map(|t| t.price).sum();
    let total = service.len() as u64 + cancelled_count;
    CancellationMetrics {
        cancelled_count,
        lost_revenue,
        rate: pct(cancelled_count as f64, total as f64),
    }
}

fn category_breakdown(service: &[&TransactionRecord]) -> CategoryBreakdown {
    let mut breakdown = CategoryBreakdown::default();

    for t in service {
        bump(
            &mut breakdown.packages,
            t.package.as_deref().unwrap_or(NONE_BUCKET),
            t.price as f64,
        );
        bump(
            &mut breakdown.priority_bookings,
            t.priority_booking.as_deref().unwrap_or(NONE_BUCKET),
            t.price as f64,
        );

        let addons = t.addons.normalize();
        if addons.is_empty() {
            bump(&mut breakdown.addons, NONE_BUCKET, 0.0);
        } else {
            // A transaction with N add-ons lands in N buckets; its undivided
            // total is split evenly except where a per-item price is known.
            let even_share = t.addon_total as f64 / addons.len() as f64;
            for item in &addons {
                let revenue = item.amount.map(|a| a as f64).unwrap_or(even_share);
                bump(&mut breakdown.addons, &item.label, revenue);
            }
        }

        let discounts = t.discounts.normalize();
        if discounts.is_empty() {
            if t.discount_total != 0 {
                bump(&mut breakdown.discounts, NONE_BUCKET, t.discount_total as f64);
            }
        } else {
            let even_share = t.discount_total as f64 / discounts.len() as f64;
            for item in &discounts {
                let amount = item.amount.map(|a| a as f64).unwrap_or(even_share);
                bump(&mut breakdown.discounts, &item.label, amount);
            }
        }
    }

    breakdown
}

fn bump(map: &mut BTreeMap<String, BucketStat>, key: &str, revenue: f64) {
    let stat = map.entry(key.to_string()).or_default();
    stat.count += 1;
    stat.revenue += revenue;
}

/// num / den × 100, 0 when the denominator is 0.
fn pct(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den * 100.0
    }
}

/// num / den, 0 when the denominator is 0.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
