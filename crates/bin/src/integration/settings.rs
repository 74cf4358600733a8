//! Run configuration: defaults, then the config file, then command-line flags.

use accrete_data::FieldBinding;
use accrete_engine::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::debug;

/// Everything a run needs besides the input path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RunConfig {
    /// Report parameters.
    #[serde(flatten)]
    pub(crate) analysis: AnalysisConfig,

    /// Source column names.
    pub(crate) binding: FieldBinding,
}

/// Column overrides taken from global flags.
#[derive(Debug, Clone, Default)]
pub(crate) struct BindingOverrides {
    pub(crate) user_id: Option<String>,
    pub(crate) activity_date: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) segment: Option<String>,
    pub(crate) date_format: Option<String>,
}

impl RunConfig {
    /// Read a JSON config file.
    pub(crate) fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| format!("invalid config {}: {e}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Replace bound columns with any that were given on the command line.
    pub(crate) fn apply_binding(&mut self, overrides: BindingOverrides) {
        let binding = &mut self.binding;
        if let Some(column) = overrides.user_id {
            binding.user_id = column;
        }
        if let Some(column) = overrides.activity_date {
            binding.activity_date = column;
        }
        if let Some(column) = overrides.amount {
            binding.amount = column;
        }
        if overrides.segment.is_some() {
            binding.segment = overrides.segment;
        }
        if overrides.date_format.is_some() {
            binding.date_format = overrides.date_format;
        }
    }
}
