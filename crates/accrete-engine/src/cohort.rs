//! Cohort retention.
//!
//! Users are partitioned by the period of their first activity. For every
//! (cohort, period) pair the engine reports how many cohort members were
//! active, the share of the cohort that represents, and the cohort's
//! cumulative spend.

use crate::activity::DailyActivity;
use crate::config::CohortConfig;
use crate::error::Result;
use crate::period::Period;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Activity of one cohort in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    /// Period of the cohort's first activity.
    pub first_period: Period,

    /// Period described by the row.
    pub period: Period,

    /// Whole periods elapsed since `first_period`.
    pub periods_since_first: i64,

    /// Cohort spend within `period`.
    pub spend: f64,

    /// Cohort spend from `first_period` through `period`.
    pub cumulative_spend: f64,

    /// Users acquired in `first_period`.
    pub cohort_size: u64,

    /// Cohort members active in `period`.
    pub active_users: u64,

    /// active_users / cohort_size
    pub retention_pct: f64,

    /// cumulative_spend / cohort_size
    pub cumulative_spend_per_user: f64,
}

/// Compute the cohort retention report.
///
/// The period containing `as_of` is excluded unless
/// `include_current_period` is set, and `lookback_periods` further
/// completed periods are dropped from the tail. Cumulative spend is
/// accumulated before the tail is cut.
pub fn cohort_retention(
    daily: &DailyActivity,
    config: &CohortConfig,
    as_of: NaiveDate,
) -> Result<Vec<CohortRow>> {
    config.validate()?;
    let granularity = config.granularity;

    let mut cells: BTreeMap<(Period, Period), (f64, u64)> = BTreeMap::new();
    for row in daily.rollup(granularity) {
        let Some(first) = daily.first_activity().get(&row.user_id) else {
            continue;
        };
        let cell = cells
            .entry((first.anchor(granularity), row.period))
            .or_insert((0.0, 0));
        cell.0 += row.amount;
        cell.1 += 1;
    }

    let current = Period::containing(granularity, as_of);
    let min_gap = i64::from(config.lookback_periods) + i64::from(!config.include_current_period);

    let mut report = Vec::with_capacity(cells.len());
    let mut cohort: Option<(Period, u64, f64)> = None;

    for ((first_period, period), (spend, active_users)) in cells {
        let (cohort_size, cumulative_spend) = match cohort {
            Some((p, size, cumulative)) if p == first_period => (size, cumulative + spend),
            _ => (active_users, spend),
        };
        cohort = Some((first_period, cohort_size, cumulative_spend));

        if period.distance(&current)? < min_gap {
            continue;
        }

        let size = cohort_size as f64;
        report.push(CohortRow {
            first_period,
            period,
            periods_since_first: first_period.distance(&period)?,
            spend,
            cumulative_spend,
            cohort_size,
            active_users,
            retention_pct: active_users as f64 / size,
            cumulative_spend_per_user: cumulative_spend / size,
        });
    }

    for first_period in non_monotone_cohorts(&report) {
        warn!(
            cohort = %first_period,
            "active users increase after acquisition"
        );
    }
    info!(
        granularity = %granularity,
        rows = report.len(),
        "computed cohort retention"
    );
    Ok(report)
}

/// Cohorts whose active-user count rises from one reported period to a later one.
///
/// Retention curves are expected to decay, but resurrected users can push a
/// later period above an earlier one.
pub fn non_monotone_cohorts(rows: &[CohortRow]) -> Vec<Period> {
    let mut offenders: Vec<Period> = rows
        .windows(2)
        .filter(|pair| {
            pair[0].first_period == pair[1].first_period
                && pair[1].active_users > pair[0].active_users
        })
        .map(|pair| pair[0].first_period)
        .collect();
    offenders.dedup();
    offenders
}
