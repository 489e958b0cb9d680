use chrono::NaiveDate;
use serde::Serialize;

use crate::diary;

/// Tunable cutoffs behind the risk predicates.
///
/// The defaults carry the values the console has always shipped with; none
/// of them are business-validated, so they live here as configuration rather
/// than as literals at the evaluation sites.
#[derive(Debug, Clone, Serialize)]
pub struct RiskThresholds {
    /// Working rate at or below this percentage flags.
    pub low_working_rate: f64,
    /// Payout at or below this fraction of the target flags.
    pub earnings_floor: f64,
    /// Month-over-month payout change at or below this percentage flags.
    pub earnings_drop_pct: f64,
    /// Absences reaching this fraction of worked days flag.
    pub absence_ratio: f64,
    /// Consecutive absent days that flag on their own.
    pub absence_run: usize,
    /// Days since the last worked date before attendance counts as stale.
    pub stale_days: i64,
    /// Consecutive low-booking days that flag.
    pub low_booking_run: usize,
    /// Cancellation rate at or above this percentage flags.
    pub high_cancellation_rate: f64,
    /// Diary posts per worked day under the under-posting rule.
    pub diary_multiplier: u64,
    /// Case-note substrings that read as concerns, matched case-insensitively.
    pub concern_keywords: Vec<String>,
    /// True-predicate counts at which the level reaches medium and high.
    pub medium_at: usize,
    pub high_at: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            low_working_rate: 30.0,
            earnings_floor: 0.5,
            earnings_drop_pct: -40.0,
            absence_ratio: 0.3,
            absence_run: 3,
            stale_days: 14,
            low_booking_run: 3,
            high_cancellation_rate: 30.0,
            diary_multiplier: 2,
            concern_keywords: ["quit", "resign", "complaint", "trouble", "exhausted", "burnout"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            medium_at: 4,
            high_at: 6,
        }
    }
}

/// Numeric evidence the twelve predicates evaluate against. Assembled by the
/// analyzer from the window snapshots, streak scans and collaborator fetches,
/// and retained on the assessment for display and audit.
#[derive(Debug, Clone, Serialize)]
pub struct RiskInputs {
    /// Worked-day counts, oldest window first.
    pub worked_day_series: [u64; 3],
    /// Longest run of month-over-month worked-day declines.
    pub decline_run: usize,
    pub working_rate: f64,
    pub payout: i64,
    pub prior_payout: i64,
    pub target_earnings: i64,
    pub worked_days: u64,
    pub absence_days: u64,
    /// Longest run of consecutive absent days.
    pub absence_run: usize,
    /// Most recent actually-worked date in the window, if any.
    pub last_worked: Option<NaiveDate>,
    /// Evaluation date for the staleness gap.
    pub as_of: NaiveDate,
    pub window_start: NaiveDate,
    /// Longest run of consecutive scheduled-but-low-booking days.
    pub low_booking_run: usize,
    pub cancellation_rate: f64,
    pub diary_posts: usize,
    /// Text of the most recent case note, if any.
    pub latest_note: Option<String>,
    /// Whether a one-on-one meeting fell inside the current window.
    pub met_this_window: bool,
}

/// One evaluated predicate with its supporting evidence, human-readable.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFlag {
    pub name: &'static str,
    pub triggered: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Twelve predicates, a true-count, and the derived level.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub flags: Vec<RiskFlag>,
    pub true_count: usize,
    pub level: RiskLevel,
    pub inputs: RiskInputs,
}

/// Evaluate the twelve retention-risk predicates. Every predicate is
/// evaluated independently; nothing short-circuits.
pub fn classify(inputs: RiskInputs, thresholds: &RiskThresholds) -> RiskAssessment {
    let mut flags = Vec::with_capacity(12);

    flags.push(RiskFlag {
        name: "attendance_decline",
        triggered: inputs.decline_run >= 2,
        detail: format!(
            "worked days {:?} oldest-first, {} consecutive declines",
            inputs.worked_day_series, inputs.decline_run
        ),
    });

    flags.push(RiskFlag {
        name: "low_working_rate",
        triggered: inputs.working_rate <= thresholds.low_working_rate,
        detail: format!(
            "working rate {:.1}% (flag at ≤ {:.0}%)",
            inputs.working_rate, thresholds.low_working_rate
        ),
    });

    let earnings_floor = thresholds.earnings_floor * inputs.target_earnings as f64;
    flags.push(RiskFlag {
        name: "low_earnings",
        triggered: (inputs.payout as f64) <= earnings_floor,
        detail: format!(
            "payout ¥{} against target ¥{} (flag at ≤ ¥{:.0})",
            inputs.payout, inputs.target_earnings, earnings_floor
        ),
    });

    // Only meaningful against a real prior month.
    let drop_pct = if inputs.prior_payout > 0 {
        Some(
            (inputs.payout - inputs.prior_payout) as f64 / inputs.prior_payout as f64 * 100.0,
        )
    } else {
        None
    };
    flags.push(RiskFlag {
        name: "earnings_drop",
        triggered: drop_pct.is_some_and(|p| p <= thresholds.earnings_drop_pct),
        detail: match drop_pct {
            Some(p) => format!(
                "payout moved {:+.1}% from ¥{} (flag at ≤ {:.0}%)",
                p, inputs.prior_payout, thresholds.earnings_drop_pct
            ),
            None => "no prior-month payout to compare".to_string(),
        },
    });

    // Both sides divide by worked days, so an idle month cannot evaluate.
    let daily_average = if inputs.worked_days > 0 {
        let daily_payout = inputs.payout as f64 / inputs.worked_days as f64;
        let daily_floor = earnings_floor / inputs.worked_days as f64;
        Some((daily_payout, daily_floor))
    } else {
        None
    };
    flags.push(RiskFlag {
        name: "low_daily_average",
        triggered: daily_average.is_some_and(|(payout, floor)| payout <= floor),
        detail: match daily_average {
            Some((payout, floor)) => {
                format!("¥{payout:.0} per worked day (flag at ≤ ¥{floor:.0})")
            }
            None => "no worked days this window".to_string(),
        },
    });

    // ceil of the ratio, clamped to 1 so an empty month does not self-flag.
    let absence_cutoff =
        ((thresholds.absence_ratio * inputs.worked_days as f64).ceil() as u64).max(1);
    flags.push(RiskFlag {
        name: "absence_rate",
        triggered: inputs.absence_days >= absence_cutoff
            || inputs.absence_run >= thresholds.absence_run,
        detail: format!(
            "{} absences (flag at ≥ {}), longest run {} days (flag at ≥ {})",
            inputs.absence_days, absence_cutoff, inputs.absence_run, thresholds.absence_run
        ),
    });

    let stale_gap = match inputs.last_worked {
        Some(d) => (inputs.as_of - d).num_days(),
        None => (inputs.as_of - inputs.window_start).num_days(),
    };
    flags.push(RiskFlag {
        name: "stale_attendance",
        triggered: stale_gap >= thresholds.stale_days,
        detail: match inputs.last_worked {
            Some(d) => format!("last worked {d}, {stale_gap} days ago"),
            None => format!("no worked date this window, {stale_gap} days since it began"),
        },
    });

    flags.push(RiskFlag {
        name: "booking_drought",
        triggered: inputs.low_booking_run >= thresholds.low_booking_run,
        detail: format!(
            "{} consecutive low-booking days (flag at ≥ {})",
            inputs.low_booking_run, thresholds.low_booking_run
        ),
    });

    flags.push(RiskFlag {
        name: "high_cancellation",
        triggered: inputs.cancellation_rate >= thresholds.high_cancellation_rate,
        detail: format!(
            "cancellation rate {:.1}% (flag at ≥ {:.0}%)",
            inputs.cancellation_rate, thresholds.high_cancellation_rate
        ),
    });

    flags.push(RiskFlag {
        name: "under_posting",
        triggered: diary::under_posting(
            inputs.diary_posts,
            inputs.worked_days,
            thresholds.diary_multiplier,
        ),
        detail: format!(
            "{} diary posts over {} worked days (flag at ≤ {})",
            inputs.diary_posts,
            inputs.worked_days,
            inputs.worked_days * thresholds.diary_multiplier
        ),
    });

    let note_hit = inputs.latest_note.as_deref().and_then(|text| {
        let lowered = text.to_lowercase();
        thresholds
            .concern_keywords
            .iter()
            .find(|kw| lowered.contains(&kw.to_lowercase()))
            .cloned()
    });
    flags.push(RiskFlag {
        name: "negative_note",
        triggered: note_hit.is_some(),
        detail: match &note_hit {
            Some(kw) => format!("latest case note mentions {kw:?}"),
            None => "latest case note raises no concern keyword".to_string(),
        },
    });

    flags.push(RiskFlag {
        name: "no_check_in",
        triggered: !inputs.met_this_window,
        detail: if inputs.met_this_window {
            "one-on-one held this window".to_string()
        } else {
            "no one-on-one recorded this window".to_string()
        },
    });

    let true_count = flags.iter().filter(|f| f.triggered).count();
    let level = if true_count >= thresholds.high_at {
        RiskLevel::High
    } else if true_count >= thresholds.medium_at {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        flags,
        true_count,
        level,
        inputs,
    }
}
