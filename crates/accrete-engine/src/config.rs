//! Analysis configuration.
//!
//! Each report has its own configuration struct with serde support and a
//! `validate()` that rejects values the engines cannot work with.
//! [`AnalysisConfig`] bundles all of them so a run can be described by a
//! single JSON document.

use crate::error::{EngineError, Result};
use crate::period::Granularity;
use serde::{Deserialize, Serialize};

/// Longest accepted window, in days.
pub const MAX_WINDOW_DAYS: u32 = 36_600;

pub(crate) fn check_window_days(window_days: u32) -> Result<()> {
    if window_days == 0 {
        return Err(EngineError::InvalidConfig(
            "window length must be at least one day".to_string(),
        ));
    }
    if window_days > MAX_WINDOW_DAYS {
        return Err(EngineError::InvalidConfig(format!(
            "window length of {window_days} days exceeds the maximum of {MAX_WINDOW_DAYS}"
        )));
    }
    Ok(())
}

fn require_period_granularity(granularity: Granularity) -> Result<()> {
    match granularity {
        Granularity::Week | Granularity::Month => Ok(()),
        Granularity::Day => Err(EngineError::InvalidConfig(
            "granularity must be week or month".to_string(),
        )),
    }
}

/// Configuration for the periodic growth accounting report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Period granularity (default: month)
    pub granularity: Granularity,

    /// Drop the final, possibly in-progress period (default: false)
    pub drop_trailing_period: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            drop_trailing_period: false,
        }
    }
}

impl GrowthConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        require_period_granularity(self.granularity)
    }
}

/// Configuration for the rolling quick-ratio report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingConfig {
    /// Window lengths in days; each produces its own series (default: 7, 28, 84)
    pub window_days: Vec<u32>,

    /// Split every window by segment (default: false)
    pub use_segment: bool,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            window_days: vec![7, 28, 84],
            use_segment: false,
        }
    }
}

impl RollingConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.window_days.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one window length is required".to_string(),
            ));
        }
        self.window_days
            .iter()
            .try_for_each(|&window_days| check_window_days(window_days))
    }
}

/// Configuration for the cohort retention report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    /// Period granularity (default: month)
    pub granularity: Granularity,

    /// Completed periods to drop from the tail, besides the current one (default: 0)
    pub lookback_periods: u32,

    /// Keep the current, still-accumulating period (default: false)
    pub include_current_period: bool,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            lookback_periods: 0,
            include_current_period: false,
        }
    }
}

impl CohortConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        require_period_granularity(self.granularity)
    }
}

/// Configuration for the DAU/XAU frequency report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    /// Trailing window length in days (default: 28)
    pub window_days: u32,

    /// Strictly increasing active-day thresholds (default: 1, 7, 14, 21)
    pub thresholds: Vec<u32>,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            window_days: 28,
            thresholds: vec![1, 7, 14, 21],
        }
    }
}

impl FrequencyConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        check_window_days(self.window_days)?;
        if self.thresholds.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one threshold is required".to_string(),
            ));
        }
        if self
            .thresholds
            .iter()
            .any(|&k| k == 0 || k > self.window_days)
        {
            return Err(EngineError::InvalidConfig(format!(
                "thresholds must lie between 1 and the window length ({})",
                self.window_days
            )));
        }
        if self.thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(EngineError::InvalidConfig(
                "thresholds must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for every report of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Periodic growth accounting
    pub growth: GrowthConfig,
    /// Rolling quick ratio
    pub rolling: RollingConfig,
    /// Cohort retention
    pub cohort: CohortConfig,
    /// DAU/XAU frequency
    pub frequency: FrequencyConfig,
}

impl AnalysisConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.growth.validate()?;
        self.rolling.validate()?;
        self.cohort.validate()?;
        self.frequency.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rolling.window_days, vec![7, 28, 84]);
        assert_eq!(config.frequency.thresholds, vec![1, 7, 14, 21]);
    }

    #[test]
    fn test_day_granularity_rejected() {
        let config = GrowthConfig {
            granularity: Granularity::Day,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_rolling_windows() {
        let empty = RollingConfig {
            window_days: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let zero = RollingConfig {
            window_days: vec![7, 0],
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let huge = RollingConfig {
            window_days: vec![u32::MAX],
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_window_length_cap() {
        let at_cap = FrequencyConfig {
            window_days: MAX_WINDOW_DAYS,
            thresholds: vec![1],
        };
        assert!(at_cap.validate().is_ok());

        let over = FrequencyConfig {
            window_days: MAX_WINDOW_DAYS + 1,
            thresholds: vec![1],
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_invalid_thresholds() {
        let unordered = FrequencyConfig {
            window_days: 28,
            thresholds: vec![7, 1],
        };
        assert!(unordered.validate().is_err());

        let too_large = FrequencyConfig {
            window_days: 7,
            thresholds: vec![1, 14],
        };
        assert!(too_large.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"growth": {"granularity": "week"}}"#).unwrap();
        assert_eq!(config.growth.granularity, Granularity::Week);
        assert!(!config.growth.drop_trailing_period);
        assert_eq!(config.cohort, CohortConfig::default());
    }
}
