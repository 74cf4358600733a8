//! DAU/XAU usage frequency.
//!
//! For a trailing window of W days ending on D, every user's active days are
//! the distinct days in `[D-W+1, D]` with positive activity. The report
//! summarises how often active users show up and how many clear each
//! active-day threshold.

use super::index::ActivityIndex;
use crate::config::FrequencyConfig;
use crate::error::{EngineError, Result};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Users active on at least `min_active_days` days of the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdBreakout {
    /// Threshold k of the "k-day-active+" group.
    pub min_active_days: u32,
    /// Users in the group.
    pub users: u64,
    /// Share of all active users (the 1-day-active population).
    pub share: f64,
}

/// Frequency summary of one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    /// Last day of the window.
    pub window_end_date: NaiveDate,
    /// Window length in days.
    pub window_days: u32,
    /// Distinct users with any activity in the window.
    pub active_users: u64,
    /// Sum of active days over all users.
    pub total_active_days: u64,
    /// (Σ active_days / W) / active_users
    pub average_frequency_ratio: f64,
    /// Expected active days per active user per window.
    pub window_frequency: f64,
    /// One entry per configured threshold, in threshold order.
    pub breakouts: Vec<ThresholdBreakout>,
}

/// Evaluate the frequency summary of the window ending on `end`.
pub fn evaluate_frequency(
    index: &ActivityIndex,
    end: NaiveDate,
    config: &FrequencyConfig,
) -> Result<FrequencyRow> {
    config.validate()?;
    frequency_row(index, end, config)
}

fn frequency_row(
    index: &ActivityIndex,
    end: NaiveDate,
    config: &FrequencyConfig,
) -> Result<FrequencyRow> {
    let window = f64::from(config.window_days);
    let start = end
        .checked_sub_days(Days::new(u64::from(config.window_days) - 1))
        .ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "window of {} days cannot end on {end}",
                config.window_days
            ))
        })?;

    // Segmented rows can repeat a user on one day; count each day once.
    let mut seen: HashSet<(NaiveDate, usize)> = HashSet::new();
    let mut active_days: HashMap<usize, u32> = HashMap::new();
    for (date, row) in index.range(start, end) {
        if row.amount > 0.0 && seen.insert((date, row.user)) {
            *active_days.entry(row.user).or_insert(0) += 1;
        }
    }

    let active_users = active_days.len() as u64;
    let total_active_days: u64 = active_days.values().map(|&d| u64::from(d)).sum();
    let average_frequency_ratio = if active_users > 0 {
        (total_active_days as f64 / window) / active_users as f64
    } else {
        f64::NAN
    };

    let breakouts = config
        .thresholds
        .iter()
        .map(|&k| {
            let users = active_days.values().filter(|&&d| d >= k).count() as u64;
            ThresholdBreakout {
                min_active_days: k,
                users,
                share: if active_users > 0 {
                    users as f64 / active_users as f64
                } else {
                    f64::NAN
                },
            }
        })
        .collect();

    Ok(FrequencyRow {
        window_end_date: end,
        window_days: config.window_days,
        active_users,
        total_active_days,
        average_frequency_ratio,
        window_frequency: average_frequency_ratio * window,
        breakouts,
    })
}

/// Compute the frequency report for every day from `first_date + (W-1)`
/// through the last activity date.
///
/// Days are evaluated in parallel; `progress` is called once per window end
/// date and must tolerate concurrent calls.
pub fn frequency_report<F>(
    index: &ActivityIndex,
    config: &FrequencyConfig,
    progress: F,
) -> Result<Vec<FrequencyRow>>
where
    F: Fn(NaiveDate) + Sync,
{
    config.validate()?;
    let ends = frequency_window_ends(index, config);

    let report: Vec<_> = ends
        .par_iter()
        .map(|&end| {
            let row = frequency_row(index, end, config);
            progress(end);
            row
        })
        .collect::<Result<_>>()?;

    info!(
        window_days = config.window_days,
        rows = report.len(),
        "computed usage frequency"
    );
    Ok(report)
}

/// Window end dates [`frequency_report`] will evaluate.
pub fn frequency_window_ends(index: &ActivityIndex, config: &FrequencyConfig) -> Vec<NaiveDate> {
    index.window_end_dates(u64::from(config.window_days.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityRecord, DailyActivity};
    use approx::assert_relative_eq;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n - 1)
    }

    fn config() -> FrequencyConfig {
        FrequencyConfig {
            window_days: 7,
            thresholds: vec![1, 3, 5],
        }
    }

    fn index() -> ActivityIndex {
        let mut records = Vec::new();
        // "heavy" is active every day, "light" on two days, "once" on one day
        for d in 1..=7 {
            records.push(ActivityRecord::new("heavy", day(d), 1.0));
        }
        records.push(ActivityRecord::new("light", day(2), 1.0));
        records.push(ActivityRecord::new("light", day(2), 3.0));
        records.push(ActivityRecord::new("light", day(6), 1.0));
        records.push(ActivityRecord::new("once", day(7), 1.0));
        records.push(ActivityRecord::new("refund", day(7), -1.0));
        ActivityIndex::new(&DailyActivity::from_records(records, false).unwrap())
    }

    #[test]
    fn test_frequency_row() {
        let row = evaluate_frequency(&index(), day(7), &config()).unwrap();

        assert_eq!(row.active_users, 3);
        assert_eq!(row.total_active_days, 7 + 2 + 1);
        assert_relative_eq!(row.average_frequency_ratio, (10.0 / 7.0) / 3.0);
        assert_relative_eq!(row.window_frequency, 10.0 / 3.0);

        let counts: Vec<_> = row.breakouts.iter().map(|b| b.users).collect();
        assert_eq!(counts, vec![3, 1, 1]);
        assert_relative_eq!(row.breakouts[0].share, 1.0);
        assert_relative_eq!(row.breakouts[1].share, 1.0 / 3.0);
    }

    #[test]
    fn test_segmented_rows_count_a_day_once() {
        let records = vec![
            ActivityRecord::new("a", day(1), 1.0).with_segment("web"),
            ActivityRecord::new("a", day(1), 1.0).with_segment("ios"),
        ];
        let index = ActivityIndex::new(&DailyActivity::from_records(records, true).unwrap());
        let row = evaluate_frequency(&index, day(1), &config()).unwrap();

        assert_eq!(row.active_users, 1);
        assert_eq!(row.total_active_days, 1);
    }

    #[test]
    fn test_frequency_report_range() {
        let report = frequency_report(&index(), &config(), |_| {}).unwrap();

        // Only one full window: ending on day 7
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].window_end_date, day(7));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let config = FrequencyConfig {
            window_days: 7,
            thresholds: vec![3, 1],
        };
        assert!(evaluate_frequency(&index(), day(7), &config).is_err());
    }

    #[test]
    fn test_oversized_window_is_an_error() {
        let huge = FrequencyConfig {
            window_days: u32::MAX,
            ..config()
        };
        assert!(matches!(
            evaluate_frequency(&index(), day(7), &huge),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            evaluate_frequency(&index(), NaiveDate::MIN, &config()),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
