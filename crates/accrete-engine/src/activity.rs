//! Activity aggregation.
//!
//! Raw [`ActivityRecord`]s are filtered to positive amounts and summed per
//! user and day (and segment, when segmentation is on). Daily activity can be
//! rolled up into week or month buckets, and every user carries a
//! [`FirstActivity`] anchor derived from a single global first day.

use crate::error::{EngineError, Result};
use crate::period::{Granularity, Period};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A single raw activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// User identifier.
    pub user_id: String,

    /// Calendar date of the activity.
    pub activity_date: NaiveDate,

    /// Sign-significant amount. Only positive amounts count as activity.
    pub amount: f64,

    /// Optional segment label.
    pub segment: Option<String>,
}

impl ActivityRecord {
    /// Create an unsegmented activity record.
    pub fn new(user_id: impl Into<String>, activity_date: NaiveDate, amount: f64) -> Self {
        Self {
            user_id: user_id.into(),
            activity_date,
            amount,
            segment: None,
        }
    }

    /// Attach a segment label.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Whether this record counts as activity.
    pub fn is_active(&self) -> bool {
        self.amount > 0.0
    }
}

/// Summed activity of one user in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPeriodActivity {
    /// User identifier.
    pub user_id: String,

    /// Period the amount was summed over.
    pub period: Period,

    /// Sum of positive source amounts.
    pub amount: f64,

    /// Segment label, present only for segmented daily activity.
    pub segment: Option<String>,
}

/// First-activity anchors of a user.
///
/// The week and month anchors are the first day floored into each bucket,
/// never minimized independently per granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstActivity {
    /// Earliest activity date.
    pub first_date: NaiveDate,

    /// Week containing `first_date`.
    pub first_week: Period,

    /// Month containing `first_date`.
    pub first_month: Period,
}

impl FirstActivity {
    /// Derive all anchors from the first activity date.
    pub fn from_date(first_date: NaiveDate) -> Self {
        Self {
            first_date,
            first_week: Granularity::Week.floor(first_date),
            first_month: Granularity::Month.floor(first_date),
        }
    }

    /// Anchor period at the requested granularity.
    pub fn anchor(&self, granularity: Granularity) -> Period {
        match granularity {
            Granularity::Day => Granularity::Day.floor(self.first_date),
            Granularity::Week => self.first_week,
            Granularity::Month => self.first_month,
        }
    }
}

/// Daily activity table with first-activity anchors.
///
/// Holds exactly one row per (user, day[, segment]) and is never empty.
#[derive(Debug, Clone)]
pub struct DailyActivity {
    rows: Vec<UserPeriodActivity>,
    first_activity: BTreeMap<String, FirstActivity>,
    first_date: NaiveDate,
    last_date: NaiveDate,
    segmented: bool,
}

impl DailyActivity {
    /// Aggregate raw records into daily activity.
    ///
    /// Records with a non-positive (or NaN) amount are dropped. Duplicate
    /// (user, date[, segment]) records are summed. When `use_segment` is false
    /// any segment labels on the records are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyInput`] when no record has a positive amount.
    pub fn from_records<I>(records: I, use_segment: bool) -> Result<Self>
    where
        I: IntoIterator<Item = ActivityRecord>,
    {
        let mut sums: BTreeMap<(String, NaiveDate, Option<String>), f64> = BTreeMap::new();
        let mut seen = 0usize;

        for record in records {
            seen += 1;
            if !record.is_active() {
                continue;
            }
            let segment = if use_segment { record.segment } else { None };
            *sums
                .entry((record.user_id, record.activity_date, segment))
                .or_insert(0.0) += record.amount;
        }

        if sums.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let mut first_activity: BTreeMap<String, FirstActivity> = BTreeMap::new();
        let mut rows = Vec::with_capacity(sums.len());
        let mut first_date = NaiveDate::MAX;
        let mut last_date = NaiveDate::MIN;

        for ((user_id, date, segment), amount) in sums {
            first_date = first_date.min(date);
            last_date = last_date.max(date);
            first_activity
                .entry(user_id.clone())
                .and_modify(|first| {
                    if date < first.first_date {
                        *first = FirstActivity::from_date(date);
                    }
                })
                .or_insert_with(|| FirstActivity::from_date(date));
            rows.push(UserPeriodActivity {
                user_id,
                period: Granularity::Day.floor(date),
                amount,
                segment,
            });
        }

        debug!(
            records = seen,
            daily_rows = rows.len(),
            users = first_activity.len(),
            %first_date,
            %last_date,
            "aggregated daily activity"
        );

        Ok(Self {
            rows,
            first_activity,
            first_date,
            last_date,
            segmented: use_segment,
        })
    }

    /// Daily rows, ordered by user, date and segment.
    pub fn rows(&self) -> &[UserPeriodActivity] {
        &self.rows
    }

    /// First-activity anchors keyed by user.
    pub const fn first_activity(&self) -> &BTreeMap<String, FirstActivity> {
        &self.first_activity
    }

    /// Earliest activity date across all users.
    pub const fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    /// Latest activity date across all users.
    pub const fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// Whether rows are split by segment.
    pub const fn is_segmented(&self) -> bool {
        self.segmented
    }

    /// Number of distinct users.
    pub fn user_count(&self) -> usize {
        self.first_activity.len()
    }

    /// Re-aggregate daily activity into buckets of the given granularity.
    ///
    /// Segments are summed away: the result has one row per (user, period),
    /// ordered by user then period.
    pub fn rollup(&self, granularity: Granularity) -> Vec<UserPeriodActivity> {
        let mut sums: BTreeMap<(&str, Period), f64> = BTreeMap::new();
        for row in &self.rows {
            *sums
                .entry((row.user_id.as_str(), granularity.floor(row.period.start())))
                .or_insert(0.0) += row.amount;
        }

        let rows: Vec<_> = sums
            .into_iter()
            .map(|((user_id, period), amount)| UserPeriodActivity {
                user_id: user_id.to_string(),
                period,
                amount,
                segment: None,
            })
            .collect();

        debug!(%granularity, rows = rows.len(), "rolled up activity");
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_non_positive_amounts_are_excluded() {
        let records = vec![
            ActivityRecord::new("u1", date(2024, 1, 1), 10.0),
            ActivityRecord::new("u1", date(2024, 1, 2), -4.0),
            ActivityRecord::new("u2", date(2024, 1, 2), 0.0),
            ActivityRecord::new("u3", date(2024, 1, 3), f64::NAN),
        ];
        let daily = DailyActivity::from_records(records, false).unwrap();

        assert_eq!(daily.rows().len(), 1);
        assert_eq!(daily.user_count(), 1);
        assert_eq!(daily.last_date(), date(2024, 1, 1));
    }

    #[test]
    fn test_duplicate_rows_are_summed() {
        let records = vec![
            ActivityRecord::new("u1", date(2024, 1, 1), 10.0),
            ActivityRecord::new("u1", date(2024, 1, 1), 2.5),
        ];
        let daily = DailyActivity::from_records(records, false).unwrap();

        assert_eq!(daily.rows().len(), 1);
        assert_eq!(daily.rows()[0].amount, 12.5);
    }

    #[test]
    fn test_empty_input() {
        let records = vec![ActivityRecord::new("u1", date(2024, 1, 1), -1.0)];
        assert!(matches!(
            DailyActivity::from_records(records, false),
            Err(EngineError::EmptyInput)
        ));
    }

    #[test]
    fn test_segments_kept_only_when_requested() {
        let records = vec![
            ActivityRecord::new("u1", date(2024, 1, 1), 1.0).with_segment("web"),
            ActivityRecord::new("u1", date(2024, 1, 1), 2.0).with_segment("ios"),
        ];

        let segmented = DailyActivity::from_records(records.clone(), true).unwrap();
        assert_eq!(segmented.rows().len(), 2);
        assert!(segmented.is_segmented());

        let flat = DailyActivity::from_records(records, false).unwrap();
        assert_eq!(flat.rows().len(), 1);
        assert_eq!(flat.rows()[0].segment, None);
        assert_eq!(flat.rows()[0].amount, 3.0);
    }

    #[test]
    fn test_first_activity_anchors_share_one_first_day() {
        // First day is Sunday 2024-03-31: its week starts in March, its month is March.
        let records = vec![
            ActivityRecord::new("u1", date(2024, 4, 2), 1.0),
            ActivityRecord::new("u1", date(2024, 3, 31), 1.0),
        ];
        let daily = DailyActivity::from_records(records, false).unwrap();
        let first = daily.first_activity()["u1"];

        assert_eq!(first.first_date, date(2024, 3, 31));
        assert_eq!(first.first_week.start(), date(2024, 3, 25));
        assert_eq!(first.first_month.start(), date(2024, 3, 1));
        assert_eq!(first.anchor(Granularity::Day).start(), date(2024, 3, 31));
    }

    #[test]
    fn test_rollup_by_week_and_month() {
        let records = vec![
            ActivityRecord::new("u1", date(2024, 1, 1), 1.0),
            ActivityRecord::new("u1", date(2024, 1, 7), 2.0),
            ActivityRecord::new("u1", date(2024, 1, 8), 4.0),
            ActivityRecord::new("u2", date(2024, 2, 1), 8.0).with_segment("web"),
        ];
        let daily = DailyActivity::from_records(records, true).unwrap();

        let weekly = daily.rollup(Granularity::Week);
        assert_eq!(weekly.len(), 3);
        assert_eq!(weekly[0].period.start(), date(2024, 1, 1));
        assert_eq!(weekly[0].amount, 3.0);
        assert_eq!(weekly[1].amount, 4.0);
        assert!(weekly.iter().all(|row| row.segment.is_none()));

        let monthly = daily.rollup(Granularity::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].amount, 7.0);
        assert_eq!(monthly[1].period.start(), date(2024, 2, 1));
    }
}
