//! Calendar periods.
//!
//! A [`Period`] is a bucket of calendar days at a given [`Granularity`],
//! identified by the first day of the bucket. Week buckets start on
//! [`WEEK_START`] and span seven days; month buckets start on the first of the
//! month and span the calendar month.
//!
//! Periods are totally ordered within a granularity. Comparing the distance
//! between periods of different granularities is an error.

use crate::error::{EngineError, Result};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First day of every week bucket.
pub const WEEK_START: Weekday = Weekday::Mon;

/// Bucket size used to group daily activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One calendar day
    Day,
    /// Seven days starting on [`WEEK_START`]
    Week,
    /// One calendar month
    Month,
}

impl Granularity {
    /// Lowercase identifier of the granularity.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Floor a date to the start of its bucket.
    pub fn floor(self, date: NaiveDate) -> Period {
        let start = match self {
            Self::Day => date,
            Self::Week => {
                let offset = (date.weekday().num_days_from_monday() + 7
                    - WEEK_START.num_days_from_monday())
                    % 7;
                date - Days::new(u64::from(offset))
            }
            Self::Month => date - Days::new(u64::from(date.day0())),
        };
        Period {
            granularity: self,
            start,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Granularity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" | "d" => Ok(Self::Day),
            "week" | "weekly" | "w" => Ok(Self::Week),
            "month" | "monthly" | "m" => Ok(Self::Month),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown granularity '{other}' (expected day, week or month)"
            ))),
        }
    }
}

/// A calendar bucket identified by its granularity and first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    granularity: Granularity,
    start: NaiveDate,
}

impl Period {
    /// The period of the given granularity that contains `date`.
    pub fn containing(granularity: Granularity, date: NaiveDate) -> Self {
        granularity.floor(date)
    }

    /// Granularity of this period.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// First day of the period.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the period (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.successor().start - Days::new(1)
    }

    /// Whether `date` falls inside this period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.granularity.floor(date).start == self.start
    }

    /// The period immediately following this one.
    ///
    /// Month arithmetic always starts from the first of the month, so the
    /// result never needs day clamping.
    pub fn successor(&self) -> Self {
        let start = match self.granularity {
            Granularity::Day => self.start + Days::new(1),
            Granularity::Week => self.start + Days::new(7),
            Granularity::Month => self.start + Months::new(1),
        };
        Self {
            granularity: self.granularity,
            start,
        }
    }

    /// The period immediately preceding this one.
    pub fn predecessor(&self) -> Self {
        let start = match self.granularity {
            Granularity::Day => self.start - Days::new(1),
            Granularity::Week => self.start - Days::new(7),
            Granularity::Month => self.start - Months::new(1),
        };
        Self {
            granularity: self.granularity,
            start,
        }
    }

    /// Number of whole periods from `self` to `later`.
    ///
    /// Negative when `later` precedes `self`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::GranularityMismatch`] when the periods have
    /// different granularities.
    pub fn distance(&self, later: &Self) -> Result<i64> {
        if self.granularity != later.granularity {
            return Err(EngineError::GranularityMismatch {
                left: self.granularity,
                right: later.granularity,
            });
        }
        let days = (later.start - self.start).num_days();
        Ok(match self.granularity {
            Granularity::Day => days,
            Granularity::Week => days / 7,
            Granularity::Month => {
                let months = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
                months(later.start) - months(self.start)
            }
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2024, 1, 1), date(2024, 1, 1))] // Monday
    #[case(date(2024, 1, 3), date(2024, 1, 1))]
    #[case(date(2024, 1, 7), date(2024, 1, 1))] // Sunday
    #[case(date(2024, 1, 8), date(2024, 1, 8))]
    #[case(date(2023, 12, 31), date(2023, 12, 25))]
    fn test_week_floor(#[case] input: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(Granularity::Week.floor(input).start(), expected);
    }

    #[rstest]
    #[case(date(2024, 2, 29), date(2024, 2, 1))]
    #[case(date(2024, 3, 1), date(2024, 3, 1))]
    #[case(date(2023, 12, 31), date(2023, 12, 1))]
    fn test_month_floor(#[case] input: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(Granularity::Month.floor(input).start(), expected);
    }

    #[rstest]
    #[case(Granularity::Day, date(2024, 2, 28), date(2024, 2, 29))]
    #[case(Granularity::Week, date(2024, 2, 26), date(2024, 3, 4))]
    #[case(Granularity::Month, date(2024, 1, 31), date(2024, 2, 1))]
    #[case(Granularity::Month, date(2024, 12, 5), date(2025, 1, 1))]
    fn test_successor(
        #[case] granularity: Granularity,
        #[case] input: NaiveDate,
        #[case] expected: NaiveDate,
    ) {
        let period = Period::containing(granularity, input);
        assert_eq!(period.successor().start(), expected);
        assert_eq!(period.successor().predecessor(), period);
    }

    #[test]
    fn test_period_end_and_contains() {
        let feb = Period::containing(Granularity::Month, date(2024, 2, 10));
        assert_eq!(feb.end(), date(2024, 2, 29));
        assert!(feb.contains(date(2024, 2, 29)));
        assert!(!feb.contains(date(2024, 3, 1)));

        let week = Period::containing(Granularity::Week, date(2024, 1, 3));
        assert_eq!(week.end(), date(2024, 1, 7));
    }

    #[rstest]
    #[case(Granularity::Day, date(2024, 1, 1), date(2024, 1, 31), 30)]
    #[case(Granularity::Week, date(2024, 1, 1), date(2024, 1, 29), 4)]
    #[case(Granularity::Month, date(2023, 11, 15), date(2024, 2, 3), 3)]
    #[case(Granularity::Month, date(2024, 2, 3), date(2023, 11, 15), -3)]
    fn test_distance(
        #[case] granularity: Granularity,
        #[case] from: NaiveDate,
        #[case] to: NaiveDate,
        #[case] expected: i64,
    ) {
        let a = Period::containing(granularity, from);
        let b = Period::containing(granularity, to);
        assert_eq!(a.distance(&b).unwrap(), expected);
    }

    #[test]
    fn test_distance_granularity_mismatch() {
        let week = Period::containing(Granularity::Week, date(2024, 1, 1));
        let month = Period::containing(Granularity::Month, date(2024, 1, 1));
        assert!(matches!(
            week.distance(&month),
            Err(EngineError::GranularityMismatch { .. })
        ));
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("Week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!("monthly".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("quarter".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_period_display() {
        let period = Period::containing(Granularity::Month, date(2024, 7, 19));
        assert_eq!(period.to_string(), "2024-07-01");
    }
}
