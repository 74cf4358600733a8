//! Periodic growth accounting
//!
//! Rolls daily activity up to weeks or months, joins every period against the
//! one before it, classifies each user's movement and derives ratios against
//! the preceding period.

pub mod classify;
pub mod join;
pub mod ratio;

pub use classify::{GrowthAccountingRow, classify_period, classify_periods};
pub use join::{PeriodJoinRow, join_periods};
pub use ratio::{
    GrowthRatios, apply_ratios, retention_ratio, revenue_quick_ratio, user_quick_ratio,
};

use crate::activity::DailyActivity;
use crate::config::GrowthConfig;
use crate::error::Result;
use tracing::info;

/// Compute the periodic growth accounting report.
///
/// Periods with no active users or zero revenue are dropped, which removes
/// the churn-only period after the last observed one. With
/// `drop_trailing_period` the final remaining period is dropped as well.
pub fn growth_accounting(
    daily: &DailyActivity,
    config: &GrowthConfig,
) -> Result<Vec<GrowthAccountingRow>> {
    config.validate()?;

    let activity = daily.rollup(config.granularity);
    let joined = join_periods(&activity, daily.first_activity())?;

    let mut rows: Vec<_> = classify_periods(&joined)
        .into_iter()
        .filter(|row| !row.is_empty())
        .collect();
    if config.drop_trailing_period {
        rows.pop();
    }
    apply_ratios(&mut rows);

    info!(
        granularity = %config.granularity,
        periods = rows.len(),
        "computed growth accounting"
    );
    Ok(rows)
}
