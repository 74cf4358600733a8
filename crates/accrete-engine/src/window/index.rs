//! Date-indexed activity.
//!
//! Window engines evaluate one window per calendar day. Building this index
//! once turns each window into a range lookup instead of a scan of the full
//! activity table, and lets windows be evaluated in parallel against shared,
//! read-only data.

use crate::activity::DailyActivity;
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// One daily activity row with interned user and segment identifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedActivity {
    /// Index into [`ActivityIndex::user_id`].
    pub user: usize,
    /// Index into [`ActivityIndex::segment`], if segmented.
    pub segment: Option<usize>,
    /// Summed positive amount for the day.
    pub amount: f64,
}

/// Daily activity keyed by date.
#[derive(Debug, Clone)]
pub struct ActivityIndex {
    users: Vec<String>,
    first_dates: Vec<NaiveDate>,
    segments: Vec<String>,
    by_date: BTreeMap<NaiveDate, Vec<IndexedActivity>>,
    first_date: NaiveDate,
    last_date: NaiveDate,
    segmented: bool,
}

impl ActivityIndex {
    /// Build the index from daily activity.
    pub fn new(daily: &DailyActivity) -> Self {
        let mut users = Vec::with_capacity(daily.user_count());
        let mut first_dates = Vec::with_capacity(daily.user_count());
        let mut user_ids: HashMap<&str, usize> = HashMap::with_capacity(daily.user_count());
        for (user_id, first) in daily.first_activity() {
            user_ids.insert(user_id.as_str(), users.len());
            users.push(user_id.clone());
            first_dates.push(first.first_date);
        }

        let mut segments = Vec::new();
        let mut segment_ids: HashMap<&str, usize> = HashMap::new();
        let mut by_date: BTreeMap<NaiveDate, Vec<IndexedActivity>> = BTreeMap::new();

        for row in daily.rows() {
            let segment = row.segment.as_deref().map(|label| {
                *segment_ids.entry(label).or_insert_with(|| {
                    segments.push(label.to_string());
                    segments.len() - 1
                })
            });
            // Every daily row's user has a first-activity entry.
            let Some(&user) = user_ids.get(row.user_id.as_str()) else {
                continue;
            };
            by_date
                .entry(row.period.start())
                .or_default()
                .push(IndexedActivity {
                    user,
                    segment,
                    amount: row.amount,
                });
        }

        Self {
            users,
            first_dates,
            segments,
            by_date,
            first_date: daily.first_date(),
            last_date: daily.last_date(),
            segmented: daily.is_segmented(),
        }
    }

    /// User identifier for an interned user index.
    pub fn user_id(&self, user: usize) -> &str {
        &self.users[user]
    }

    /// Segment label for an interned segment index.
    pub fn segment(&self, segment: usize) -> &str {
        &self.segments[segment]
    }

    /// Global first-activity date of a user.
    pub fn first_date_of(&self, user: usize) -> NaiveDate {
        self.first_dates[user]
    }

    /// Earliest activity date.
    pub const fn first_date(&self) -> NaiveDate {
        self.first_date
    }

    /// Latest activity date.
    pub const fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// Whether rows carry segment labels.
    pub const fn is_segmented(&self) -> bool {
        self.segmented
    }

    /// Activity rows dated within `[start, end]`, in date order.
    pub fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (NaiveDate, &IndexedActivity)> + '_ {
        let rows = if start <= end {
            Some(self.by_date.range(start..=end))
        } else {
            None
        };
        rows.into_iter()
            .flatten()
            .flat_map(|(date, rows)| rows.iter().map(move |row| (*date, row)))
    }

    /// Window end dates from `first_date + lead_days` through the last date.
    ///
    /// Empty when the observed range is shorter than the lead.
    pub fn window_end_dates(&self, lead_days: u64) -> Vec<NaiveDate> {
        let Some(start) = self.first_date.checked_add_days(Days::new(lead_days)) else {
            return Vec::new();
        };
        start
            .iter_days()
            .take_while(|date| *date <= self.last_date)
            .collect()
    }
}
