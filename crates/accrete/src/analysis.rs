//! Report orchestration over a single activity dataset.

use crate::error::Result;
use accrete_data::{FieldBinding, load_activity, load_activity_csv};
use accrete_engine::window::{
    evaluate_frequency, evaluate_window, frequency_window_ends, rolling_window_count,
};
use accrete_engine::{
    ActivityIndex, ActivityRecord, AnalysisConfig, CohortConfig, CohortRow, DailyActivity,
    FrequencyConfig, FrequencyRow, GrowthAccountingRow, GrowthConfig, RollingConfig,
    RollingWindowRow, cohort_retention, frequency_report, growth_accounting, rolling_quick_ratio,
};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Aggregated activity plus the lazily built date index used by window reports.
///
/// Loading and aggregation happen once; every report reads the same data.
#[derive(Debug)]
pub struct Analysis {
    daily: DailyActivity,
    index: OnceLock<ActivityIndex>,
}

/// All four reports computed from one configuration.
#[derive(Debug, Clone)]
pub struct AnalysisResults {
    /// Periodic growth accounting.
    pub growth: Vec<GrowthAccountingRow>,
    /// Rolling quick ratio for every configured window length.
    pub rolling: Vec<RollingWindowRow>,
    /// Cohort retention.
    pub cohort: Vec<CohortRow>,
    /// DAU/XAU usage frequency.
    pub frequency: Vec<FrequencyRow>,
}

impl Analysis {
    /// Wrap already aggregated activity.
    pub const fn new(daily: DailyActivity) -> Self {
        Self {
            daily,
            index: OnceLock::new(),
        }
    }

    /// Aggregate raw records.
    pub fn from_records<I>(records: I, use_segment: bool) -> Result<Self>
    where
        I: IntoIterator<Item = ActivityRecord>,
    {
        Ok(Self::new(DailyActivity::from_records(records, use_segment)?))
    }

    /// Load activity from a DataFrame using `binding`.
    pub fn from_frame(df: &DataFrame, binding: &FieldBinding) -> Result<Self> {
        Ok(Self::new(load_activity(df, binding)?))
    }

    /// Load activity from a CSV file using `binding`.
    pub fn from_csv(path: impl AsRef<Path>, binding: &FieldBinding) -> Result<Self> {
        Ok(Self::new(load_activity_csv(path, binding)?))
    }

    /// Aggregated daily activity.
    pub const fn activity(&self) -> &DailyActivity {
        &self.daily
    }

    /// Date index, built on first use.
    pub fn index(&self) -> &ActivityIndex {
        self.index.get_or_init(|| {
            debug!(users = self.daily.user_count(), "building activity index");
            ActivityIndex::new(&self.daily)
        })
    }

    /// Periodic growth accounting.
    pub fn growth_accounting(&self, config: &GrowthConfig) -> Result<Vec<GrowthAccountingRow>> {
        Ok(growth_accounting(&self.daily, config)?)
    }

    /// Rolling quick ratio for every configured window length.
    pub fn rolling_quick_ratio(&self, config: &RollingConfig) -> Result<Vec<RollingWindowRow>> {
        self.rolling_quick_ratio_with_progress(config, |_| {})
    }

    /// Rolling quick ratio, reporting each evaluated window end date to `progress`.
    pub fn rolling_quick_ratio_with_progress<F>(
        &self,
        config: &RollingConfig,
        progress: F,
    ) -> Result<Vec<RollingWindowRow>>
    where
        F: Fn(NaiveDate) + Sync,
    {
        Ok(rolling_quick_ratio(self.index(), config, progress)?)
    }

    /// Number of windows the rolling report will evaluate.
    pub fn rolling_window_count(&self, config: &RollingConfig) -> usize {
        rolling_window_count(self.index(), config)
    }

    /// Evaluate one rolling window ending on `end`.
    pub fn evaluate_window(
        &self,
        end: NaiveDate,
        window_days: u32,
        use_segment: bool,
    ) -> Result<Vec<RollingWindowRow>> {
        Ok(evaluate_window(self.index(), end, window_days, use_segment)?)
    }

    /// Cohort retention with `as_of` marking the current period.
    pub fn cohort_retention(
        &self,
        config: &CohortConfig,
        as_of: NaiveDate,
    ) -> Result<Vec<CohortRow>> {
        Ok(cohort_retention(&self.daily, config, as_of)?)
    }

    /// DAU/XAU usage frequency.
    pub fn frequency(&self, config: &FrequencyConfig) -> Result<Vec<FrequencyRow>> {
        self.frequency_with_progress(config, |_| {})
    }

    /// Usage frequency, reporting each evaluated window end date to `progress`.
    pub fn frequency_with_progress<F>(
        &self,
        config: &FrequencyConfig,
        progress: F,
    ) -> Result<Vec<FrequencyRow>>
    where
        F: Fn(NaiveDate) + Sync,
    {
        Ok(frequency_report(self.index(), config, progress)?)
    }

    /// Number of windows the frequency report will evaluate.
    pub fn frequency_window_count(&self, config: &FrequencyConfig) -> usize {
        frequency_window_ends(self.index(), config).len()
    }

    /// Evaluate the frequency window ending on `end`.
    pub fn evaluate_frequency(
        &self,
        end: NaiveDate,
        config: &FrequencyConfig,
    ) -> Result<FrequencyRow> {
        Ok(evaluate_frequency(self.index(), end, config)?)
    }

    /// Compute every report.
    pub fn run(&self, config: &AnalysisConfig, as_of: NaiveDate) -> Result<AnalysisResults> {
        config.validate()?;
        Ok(AnalysisResults {
            growth: self.growth_accounting(&config.growth)?,
            rolling: self.rolling_quick_ratio(&config.rolling)?,
            cohort: self.cohort_retention(&config.cohort, as_of)?,
            frequency: self.frequency(&config.frequency)?,
        })
    }
}
