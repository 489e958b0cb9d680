use std::collections::BTreeMap;

use serde::Serialize;

/// Bucket key for transactions whose add-on/discount list is empty or
/// unrecognizable. Kept separate from real labels so rare-usage months read
/// correctly in the breakdown.
pub const NONE_BUCKET: &str = "none";

/// Count and revenue attributed to one category bucket. Revenue is fractional
/// because a transaction's add-on or discount total may be split evenly
/// across its labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BucketStat {
    pub count: u64,
    pub revenue: f64,
}

/// Attendance-side metrics: days and minutes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleMetrics {
    /// Distinct dates with a worked/late/early-leave record.
    pub worked_days: u64,
    /// Distinct dates with an absent record.
    pub absence_days: u64,
    /// Sum of service spans over transactions carrying both times.
    pub minutes_worked: u64,
    /// Sum of shift spans over attendance carrying both times.
    pub minutes_scheduled: u64,
    /// minutes_worked / minutes_scheduled × 100; 0 when nothing scheduled.
    pub working_rate: f64,
}

/// Revenue-side metrics over non-cancelled transactions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SalesMetrics {
    pub service_count: u64,
    pub gross_sales: i64,
    pub total_payout: i64,
    /// gross_sales / service_count; 0 when the window had no services.
    pub average_ticket: f64,
}

/// New-versus-repeat customer metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerMetrics {
    /// Customers whose first-ever visit to this cast fell in the window.
    pub new_customers: u64,
    /// New customers with two or more visits inside the window.
    pub repeat_customers: u64,
    /// Ids behind `new_customers`, sorted, for display and audit.
    pub new_customer_ids: Vec<String>,
}

/// Cancellation metrics over the cancelled/no-show partition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CancellationMetrics {
    pub cancelled_count: u64,
    pub lost_revenue: i64,
    /// cancelled / (service + cancelled); 0 when the window had no bookings.
    pub rate: f64,
}

/// Per-category count/revenue breakdowns. BTreeMap keeps output order stable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryBreakdown {
    pub packages: BTreeMap<String, BucketStat>,
    pub priority_bookings: BTreeMap<String, BucketStat>,
    pub addons: BTreeMap<String, BucketStat>,
    pub discounts: BTreeMap<String, BucketStat>,
}

/// Aggregate output for one cast × one monthly window. Immutable once
/// produced; any input change recomputes the whole snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub window: String,
    pub schedule: ScheduleMetrics,
    pub sales: SalesMetrics,
    pub customers: CustomerMetrics,
    pub cancellations: CancellationMetrics,
    pub categories: CategoryBreakdown,
}
