#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/accrete/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod activity;
pub mod cohort;
pub mod config;
pub mod error;
pub mod growth;
pub mod movement;
pub mod period;
pub mod window;

pub use activity::{ActivityRecord, DailyActivity, FirstActivity, UserPeriodActivity};
pub use cohort::{CohortRow, cohort_retention, non_monotone_cohorts};
pub use config::{
    AnalysisConfig, CohortConfig, FrequencyConfig, GrowthConfig, MAX_WINDOW_DAYS, RollingConfig,
};
pub use error::{EngineError, Result};
pub use growth::{GrowthAccountingRow, GrowthRatios, PeriodJoinRow, growth_accounting};
pub use movement::{MovementTally, RevenueMovement, UserMovement};
pub use period::{Granularity, Period, WEEK_START};
pub use window::{
    ActivityIndex, FrequencyRow, RollingWindowRow, ThresholdBreakout, frequency_report,
    rolling_quick_ratio,
};
