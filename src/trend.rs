use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::MetricsSnapshot;

/// Percentage movement of a metric against its prior-window value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PercentChange {
    /// Prior was zero and the current value is not. Rendered as its own
    /// marker, never as a finite number.
    Infinite,
    /// (current − prior) / prior × 100, one decimal. Both-zero pairs are 0.
    Finite(f64),
}

impl std::fmt::Display for PercentChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PercentChange::Infinite => write!(f, "+∞%"),
            PercentChange::Finite(p) => write!(f, "{p:+.1}%"),
        }
    }
}

/// Signed movement of one metric between two windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub delta: f64,
    pub percent: PercentChange,
}

/// Compare a metric against its prior-window value.
///
/// One rule for every metric pair: no metric gets bespoke rounding, and a
/// zero prior never divides.
pub fn compare(current: f64, prior: f64) -> Trend {
    let percent = if prior == 0.0 {
        if current == 0.0 {
            PercentChange::Finite(0.0)
        } else {
            PercentChange::Infinite
        }
    } else {
        PercentChange::Finite(round1((current - prior) / prior * 100.0))
    };
    Trend {
        delta: current - prior,
        percent,
    }
}

/// Pair up the comparable metrics of two snapshots. BTreeMap keeps the
/// report's metric order stable.
pub fn snapshot_trends(
    current: &MetricsSnapshot,
    prior: &MetricsSnapshot,
) -> BTreeMap<String, Trend> {
    let pairs: [(&str, f64, f64); 10] = [
        (
            "worked_days",
            current.schedule.worked_days as f64,
            prior.schedule.worked_days as f64,
        ),
        (
            "working_rate",
            current.schedule.working_rate,
            prior.schedule.working_rate,
        ),
        (
            "minutes_worked",
            current.schedule.minutes_worked as f64,
            prior.schedule.minutes_worked as f64,
        ),
        (
            "service_count",
            current.sales.service_count as f64,
            prior.sales.service_count as f64,
        ),
        (
            "gross_sales",
            current.sales.gross_sales as f64,
            prior.sales.gross_sales as f64,
        ),
        (
            "total_payout",
            current.sales.total_payout as f64,
            prior.sales.total_payout as f64,
        ),
        (
            "average_ticket",
            current.sales.average_ticket,
            prior.sales.average_ticket,
        ),
        (
            "new_customers",
            current.customers.new_customers as f64,
            prior.customers.new_customers as f64,
        ),
        (
            "repeat_customers",
            current.customers.repeat_customers as f64,
            prior.customers.repeat_customers as f64,
        ),
        (
            "cancellation_rate",
            current.cancellations.rate,
            prior.cancellations.rate,
        ),
    ];

    pairs
        .into_iter()
        .map(|(name, cur, pri)| (name.to_string(), compare(cur, pri)))
        .collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
