//! Error types for engine operations.

use crate::period::Granularity;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while computing growth accounting reports.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No activity row survived the positive-amount filter
    #[error("No activity rows with a positive amount")]
    EmptyInput,

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Periods of different granularities were compared
    #[error("Granularity mismatch: cannot compare a {left} period with a {right} period")]
    GranularityMismatch {
        /// Granularity of the left-hand period
        left: Granularity,
        /// Granularity of the right-hand period
        right: Granularity,
    },
}
