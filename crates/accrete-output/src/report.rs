//! Timestamped JSON envelopes for report output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required builder field was not set.
    #[error("Report is missing {0}")]
    MissingField(&'static str),
}

/// A generated report together with the parameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report kind, e.g. `growth` or `cohort`.
    pub kind: String,

    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Parameters the report was computed with.
    pub parameters: serde_json::Value,

    /// Report rows.
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report stamped with the current time.
    pub fn new(
        kind: impl Into<String>,
        parameters: serde_json::Value,
        contents: serde_json::Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            generated_at: Utc::now(),
            parameters,
            contents,
        }
    }

    /// Convert report to a compact JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Convert report to a pretty JSON string.
    pub fn to_pretty_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of rows in the report contents.
    pub fn row_count(&self) -> usize {
        self.contents.as_array().map_or(0, Vec::len)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    kind: Option<String>,
    parameters: Option<serde_json::Value>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the report kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the parameters from any serializable configuration.
    pub fn parameters<P: Serialize>(mut self, parameters: &P) -> Result<Self, ReportError> {
        self.parameters = Some(serde_json::to_value(parameters)?);
        Ok(self)
    }

    /// Set the report rows.
    pub fn rows<R: Serialize + ?Sized>(mut self, rows: &R) -> Result<Self, ReportError> {
        self.contents = Some(serde_json::to_value(rows)?);
        Ok(self)
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let kind = self.kind.ok_or(ReportError::MissingField("kind"))?;
        Ok(Report::new(
            kind,
            self.parameters.unwrap_or(serde_json::Value::Null),
            self.contents.unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
        ))
    }
}
