//! Period join.
//!
//! Every user-period row plays two roles: the "current" side of its own
//! period and the "prior" side of its successor period. A full outer join of
//! the two roles on (user, period) links each period only to the period
//! immediately before it, so activity gaps surface as a churn row followed by
//! a resurrection row rather than a direct jump across the gap.

use crate::activity::{FirstActivity, UserPeriodActivity};
use crate::error::{EngineError, Result};
use crate::period::Period;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One user's current and prior activity for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodJoinRow {
    /// User identifier.
    pub user_id: String,

    /// Period this row describes.
    pub period: Period,

    /// Activity in `period`, if any.
    pub current: Option<f64>,

    /// Activity in the period before `period`, if any.
    pub prior: Option<f64>,

    /// User's first-activity anchor at the row's granularity.
    pub first_period: Option<Period>,
}

impl PeriodJoinRow {
    /// Whether the user was active in this period.
    pub fn is_current_active(&self) -> bool {
        self.current.is_some_and(|t| t > 0.0)
    }

    /// Whether the user was active in the preceding period.
    pub fn is_prior_active(&self) -> bool {
        self.prior.is_some_and(|l| l > 0.0)
    }

    /// Whether the user's first period is this period.
    pub fn is_first_period(&self) -> bool {
        self.current.is_some() && self.first_period == Some(self.period)
    }
}

/// Full-join each period's activity with the previous period's activity.
///
/// Returns exactly one row per (user, period) that has activity in that
/// period, in the period before it, or both, ordered by period then user.
///
/// # Errors
///
/// Returns [`EngineError::GranularityMismatch`] if `activity` mixes
/// granularities.
pub fn join_periods(
    activity: &[UserPeriodActivity],
    first_activity: &BTreeMap<String, FirstActivity>,
) -> Result<Vec<PeriodJoinRow>> {
    let Some(head) = activity.first() else {
        return Ok(Vec::new());
    };
    let granularity = head.period.granularity();

    let mut sides: BTreeMap<(Period, &str), (Option<f64>, Option<f64>)> = BTreeMap::new();
    for row in activity {
        if row.period.granularity() != granularity {
            return Err(EngineError::GranularityMismatch {
                left: granularity,
                right: row.period.granularity(),
            });
        }
        let user = row.user_id.as_str();

        let (current, _) = sides.entry((row.period, user)).or_default();
        *current.get_or_insert(0.0) += row.amount;

        let (_, prior) = sides.entry((row.period.successor(), user)).or_default();
        *prior.get_or_insert(0.0) += row.amount;
    }

    let joined: Vec<_> = sides
        .into_iter()
        .map(|((period, user), (current, prior))| PeriodJoinRow {
            user_id: user.to_string(),
            period,
            current,
            prior,
            first_period: first_activity
                .get(user)
                .map(|first| first.anchor(granularity)),
        })
        .collect();

    debug!(
        %granularity,
        input_rows = activity.len(),
        joined_rows = joined.len(),
        "joined periods"
    );
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::Granularity;
    use chrono::NaiveDate;

    fn month(y: i32, m: u32) -> Period {
        Granularity::Month.floor(NaiveDate::from_ymd_opt(y, m, 1).unwrap())
    }

    fn row(user: &str, period: Period, amount: f64) -> UserPeriodActivity {
        UserPeriodActivity {
            user_id: user.to_string(),
            period,
            amount,
            segment: None,
        }
    }

    fn anchors(users: &[(&str, Period)]) -> BTreeMap<String, FirstActivity> {
        users
            .iter()
            .map(|(user, period)| (user.to_string(), FirstActivity::from_date(period.start())))
            .collect()
    }

    #[test]
    fn test_gap_links_through_missing_period() {
        let activity = vec![row("u1", month(2024, 1), 5.0), row("u1", month(2024, 3), 7.0)];
        let first = anchors(&[("u1", month(2024, 1))]);
        let joined = join_periods(&activity, &first).unwrap();

        let periods: Vec<_> = joined.iter().map(|r| r.period).collect();
        assert_eq!(
            periods,
            vec![month(2024, 1), month(2024, 2), month(2024, 3), month(2024, 4)]
        );

        // January: new, no prior
        assert_eq!(joined[0].current, Some(5.0));
        assert_eq!(joined[0].prior, None);
        assert!(joined[0].is_first_period());
        // February: departure from January, never a direct January -> March link
        assert_eq!(joined[1].current, None);
        assert_eq!(joined[1].prior, Some(5.0));
        // March: return with no prior
        assert_eq!(joined[2].current, Some(7.0));
        assert_eq!(joined[2].prior, None);
        assert!(!joined[2].is_first_period());
        // April: departure from March
        assert_eq!(joined[3].prior, Some(7.0));
    }

    #[test]
    fn test_consecutive_periods_pair_up() {
        let activity = vec![row("u1", month(2024, 1), 5.0), row("u1", month(2024, 2), 9.0)];
        let first = anchors(&[("u1", month(2024, 1))]);
        let joined = join_periods(&activity, &first).unwrap();

        assert_eq!(joined.len(), 3);
        assert_eq!(joined[1].current, Some(9.0));
        assert_eq!(joined[1].prior, Some(5.0));
        assert!(joined[1].is_current_active() && joined[1].is_prior_active());
    }

    #[test]
    fn test_mixed_granularity_rejected() {
        let week = Granularity::Week.floor(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let activity = vec![row("u1", month(2024, 1), 1.0), row("u1", week, 1.0)];
        assert!(join_periods(&activity, &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_empty_activity() {
        assert!(join_periods(&[], &BTreeMap::new()).unwrap().is_empty());
    }
}
