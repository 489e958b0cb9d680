use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Attendance status for one cast on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Worked,
    Late,
    EarlyLeave,
    Absent,
    #[default]
    Unset,
}

impl AttendanceStatus {
    pub fn from_label(s: &str) -> Self {
        match s.trim() {
            "worked" => AttendanceStatus::Worked,
            "late" => AttendanceStatus::Late,
            "early-leave" => AttendanceStatus::EarlyLeave,
            "absent" => AttendanceStatus::Absent,
            "unset" | "" => AttendanceStatus::Unset,
            other => {
                log::warn!("unknown attendance status {other:?}, treating as unset");
                AttendanceStatus::Unset
            }
        }
    }

    /// Statuses that count as a scheduled-and-present day.
    pub fn is_scheduled(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Worked | AttendanceStatus::Late | AttendanceStatus::EarlyLeave
        )
    }
}

impl<'de> Deserialize<'de> for AttendanceStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AttendanceStatus::from_label(&s))
    }
}

/// Final disposition of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    #[default]
    Booked,
    Confirmed,
    Cancelled,
    NoShow,
}

impl Disposition {
    /// Cancelled and no-show records are excluded from service aggregates
    /// but drive the cancellation metrics.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Disposition::Cancelled | Disposition::NoShow)
    }
}

/// One attendance entry. Written by the schedule editor, read-only here.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    pub cast_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub shift_start: Option<String>,
    #[serde(default)]
    pub shift_end: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One booked engagement, successful or cancelled.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub cast_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Booking timestamp; drives window membership and first-visit order.
    pub occurred_at: NaiveDateTime,
    pub price: i64,
    pub payout: i64,
    #[serde(default)]
    pub disposition: Disposition,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub priority_booking: Option<String>,
    #[serde(default)]
    pub addons: LabelField,
    #[serde(default)]
    pub addon_total: i64,
    #[serde(default)]
    pub discounts: LabelField,
    #[serde(default)]
    pub discount_total: i64,
    #[serde(default)]
    pub service_start: Option<String>,
    #[serde(default)]
    pub service_end: Option<String>,
}

impl TransactionRecord {
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date()
    }
}

/// A self-promotion diary post, attributed by free-text author name.
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryPost {
    pub author: String,
    pub date: NaiveDate,
}

/// Staff case note about a cast, newest first from the loader.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseNote {
    pub date: NaiveDate,
    pub text: String,
}

/// A recorded one-on-one meeting.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Meeting {
    pub date: NaiveDate,
}

/// One normalized add-on or discount entry. `amount` is present only when
/// the source recorded a per-item price.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineItem {
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default, alias = "price")]
    pub amount: Option<i64>,
}

impl LineItem {
    fn plain(label: &str) -> Self {
        LineItem {
            label: label.to_string(),
            amount: None,
        }
    }
}

/// The add-on/discount field as it arrives from the backend: sometimes a
/// proper list, sometimes a single value, sometimes a list serialized as
/// text. Resolved to `Vec<LineItem>` exactly once, at ingestion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum LabelField {
    #[default]
    Missing,
    One(String),
    Many(Vec<String>),
    Items(Vec<LineItem>),
    Other(serde_json::Value),
}

impl LabelField {
    /// Canonical list-of-entries form. Unrecognizable content normalizes to
    /// an empty list (the record lands in the explicit "none" bucket) rather
    /// than aborting aggregation.
    pub fn normalize(&self) -> Vec<LineItem> {
        match self {
            LabelField::Missing => Vec::new(),
            LabelField::One(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Vec::new()
                } else if s.starts_with('[') {
                    // A list that reached us serialized as text.
                    match serde_json::from_str::<LabelField>(s) {
                        Ok(LabelField::One(_)) | Ok(LabelField::Other(_)) | Err(_) => {
                            log::warn!("unparseable label list {s:?}, treating as none");
                            Vec::new()
                        }
                        Ok(inner) => inner.normalize(),
                    }
                } else {
                    vec![LineItem::plain(s)]
                }
            }
            LabelField::Many(labels) => labels
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(LineItem::plain)
                .collect(),
            LabelField::Items(items) => items
                .iter()
                .filter(|i| !i.label.trim().is_empty())
                .map(|i| LineItem {
                    label: i.label.trim().to_string(),
                    amount: i.amount,
                })
                .collect(),
            LabelField::Other(value) => {
                log::warn!("unexpected label encoding {value}, treating as none");
                Vec::new()
            }
        }
    }
}
