//! Error types for activity ingestion.

use accrete_engine::EngineError;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading activity.
#[derive(Debug, Error)]
pub enum DataError {
    /// A bound field is missing or cannot be read as the required type
    #[error("Schema error on field '{field}': {reason}")]
    Schema {
        /// Source field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// A value could not be parsed
    #[error("Cannot parse {field} '{value}' at row {row}")]
    Parse {
        /// Zero-based row index in the source
        row: usize,
        /// Source field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Engine error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub(crate) fn schema(field: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
