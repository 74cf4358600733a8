//! Rolling quick ratio.
//!
//! For a window ending on day D with length W, activity is summed per user
//! into three independent buckets:
//!
//! - this period: `[D-W+1, D]`
//! - last period: `[D-2W+1, D-W]`
//! - first this period: rows of users whose global first activity falls in
//!   `[D-W+1, D]`
//!
//! Users are then classified with the precedence
//! New > Retained > Resurrected > Churned > Prior. Every window is evaluated
//! from scratch; nothing carries over between days.

use super::index::ActivityIndex;
use crate::config::{RollingConfig, check_window_days};
use crate::error::{EngineError, Result};
use crate::growth::user_quick_ratio;
use crate::movement::{MovementTally, UserMovement};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Date ranges of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    /// Last day of the window (D).
    pub end: NaiveDate,
    /// First day of the current bucket (D-W+1).
    pub this_start: NaiveDate,
    /// First day of the previous bucket (D-2W+1).
    pub last_start: NaiveDate,
}

impl WindowBounds {
    /// Bounds of the window of `window_days` days ending on `end`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for a window length outside
    /// `1..=`[`MAX_WINDOW_DAYS`](crate::MAX_WINDOW_DAYS) or when the previous
    /// bucket would start before the earliest representable date.
    pub fn new(end: NaiveDate, window_days: u32) -> Result<Self> {
        check_window_days(window_days)?;
        let days = u64::from(window_days);
        let back = |n: u64| {
            end.checked_sub_days(Days::new(n)).ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "window of {window_days} days cannot end on {end}"
                ))
            })
        };
        Ok(Self {
            end,
            this_start: back(days - 1)?,
            last_start: back(2 * days - 1)?,
        })
    }

    /// Whether `date` falls in `[D-W+1, D]`.
    pub fn in_this_period(&self, date: NaiveDate) -> bool {
        self.this_start <= date && date <= self.end
    }

    /// Whether `date` falls in `[D-2W+1, D-W]`.
    pub fn in_last_period(&self, date: NaiveDate) -> bool {
        self.last_start <= date && date < self.this_start
    }
}

/// Per-user sums of the three window buckets. `None` means no activity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowBuckets {
    /// Activity in the current bucket.
    pub this_period: Option<f64>,
    /// Activity in the previous bucket.
    pub last_period: Option<f64>,
    /// Activity of a user first seen in the current bucket.
    pub first_this_period: Option<f64>,
}

impl WindowBuckets {
    fn add(slot: &mut Option<f64>, amount: f64) {
        *slot.get_or_insert(0.0) += amount;
    }

    /// Classify the user; the first matching rule wins.
    pub fn classify(&self) -> UserMovement {
        match (self.first_this_period, self.last_period, self.this_period) {
            (Some(_), _, _) => UserMovement::New,
            (None, Some(_), Some(_)) => UserMovement::Retained,
            (None, None, Some(_)) => UserMovement::Resurrected,
            (None, Some(_), None) => UserMovement::Churned,
            (None, None, None) => UserMovement::Prior,
        }
    }
}

/// Classified user counts of one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingWindowRow {
    /// Last day of the window.
    pub window_end_date: NaiveDate,

    /// Window length in days.
    pub window_days: u32,

    /// Segment label when the report is segmented.
    pub segment: Option<String>,

    /// User counts per class; churn is negative, prior users are omitted.
    pub users: MovementTally<UserMovement>,

    /// (new + resurrected) / |churned|
    pub user_quick_ratio: f64,

    /// retained / (retained + |churned|)
    pub user_retention_rate: f64,
}

impl RollingWindowRow {
    fn new(
        window_end_date: NaiveDate,
        window_days: u32,
        segment: Option<String>,
        users: MovementTally<UserMovement>,
    ) -> Self {
        let retained = users.value_or_zero(UserMovement::Retained);
        let churned = users.value_or_zero(UserMovement::Churned);
        let denominator = retained + churned.abs();
        let user_retention_rate = if denominator > 0.0 {
            retained / denominator
        } else {
            f64::NAN
        };

        Self {
            window_end_date,
            window_days,
            segment,
            user_quick_ratio: user_quick_ratio(
                users.value_or_zero(UserMovement::New),
                users.value_or_zero(UserMovement::Resurrected),
                churned,
            ),
            user_retention_rate,
            users,
        }
    }
}

/// Evaluate a single window ending on `end`.
///
/// Returns one row, or one row per segment when `use_segment` is set. A
/// window without any activity in either bucket yields no rows.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] for a window length outside
/// `1..=`[`MAX_WINDOW_DAYS`](crate::MAX_WINDOW_DAYS) or when segmentation is
/// requested on unsegmented activity.
pub fn evaluate_window(
    index: &ActivityIndex,
    end: NaiveDate,
    window_days: u32,
    use_segment: bool,
) -> Result<Vec<RollingWindowRow>> {
    if use_segment && !index.is_segmented() {
        return Err(EngineError::InvalidConfig(
            "segmentation requested but activity has no segment field".to_string(),
        ));
    }
    let bounds = WindowBounds::new(end, window_days)?;
    Ok(window_rows(index, bounds, window_days, use_segment))
}

fn window_rows(
    index: &ActivityIndex,
    bounds: WindowBounds,
    window_days: u32,
    use_segment: bool,
) -> Vec<RollingWindowRow> {
    let mut buckets: BTreeMap<(Option<usize>, usize), WindowBuckets> = BTreeMap::new();

    for (date, row) in index.range(bounds.last_start, bounds.end) {
        let segment = if use_segment { row.segment } else { None };
        let user = buckets.entry((segment, row.user)).or_default();

        if bounds.in_this_period(date) {
            WindowBuckets::add(&mut user.this_period, row.amount);
        } else if bounds.in_last_period(date) {
            WindowBuckets::add(&mut user.last_period, row.amount);
        }
        if bounds.in_this_period(index.first_date_of(row.user)) {
            WindowBuckets::add(&mut user.first_this_period, row.amount);
        }
    }

    let mut tallies: BTreeMap<Option<usize>, MovementTally<UserMovement>> = BTreeMap::new();
    for ((segment, _), user) in &buckets {
        let class = user.classify();
        let tally = tallies.entry(*segment).or_default();
        match class {
            UserMovement::Prior => {}
            UserMovement::Churned => tally.add(class, -1.0),
            _ => tally.add(class, 1.0),
        }
    }

    tallies
        .into_iter()
        .map(|(segment, users)| {
            RollingWindowRow::new(
                bounds.end,
                window_days,
                segment.map(|s| index.segment(s).to_string()),
                users,
            )
        })
        .collect()
}

/// Compute the rolling quick-ratio report for every configured window length.
///
/// Windows end on every day from `first_date + 2W` through the last activity
/// date. Days are evaluated in parallel; `progress` is called once per
/// evaluated window end date and must tolerate concurrent calls.
pub fn rolling_quick_ratio<F>(
    index: &ActivityIndex,
    config: &RollingConfig,
    progress: F,
) -> Result<Vec<RollingWindowRow>>
where
    F: Fn(NaiveDate) + Sync,
{
    config.validate()?;
    if config.use_segment && !index.is_segmented() {
        return Err(EngineError::InvalidConfig(
            "segmentation requested but activity has no segment field".to_string(),
        ));
    }

    let mut report = Vec::new();
    for &window_days in &config.window_days {
        let ends = index.window_end_dates(2 * u64::from(window_days));
        debug!(window_days, windows = ends.len(), "evaluating rolling windows");

        let per_day: Vec<Vec<RollingWindowRow>> = ends
            .par_iter()
            .map(|&end| {
                let rows = WindowBounds::new(end, window_days)
                    .map(|bounds| window_rows(index, bounds, window_days, config.use_segment));
                progress(end);
                rows
            })
            .collect::<Result<_>>()?;
        report.extend(per_day.into_iter().flatten());
    }

    info!(rows = report.len(), "computed rolling quick ratio");
    Ok(report)
}

/// Number of window end dates [`rolling_quick_ratio`] will evaluate.
pub fn rolling_window_count(index: &ActivityIndex, config: &RollingConfig) -> usize {
    config
        .window_days
        .iter()
        .map(|&w| index.window_end_dates(2 * u64::from(w)).len())
        .sum()
}
