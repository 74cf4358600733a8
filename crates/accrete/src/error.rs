//! Error types for analysis runs.

use accrete_data::DataError;
use accrete_engine::EngineError;
use thiserror::Error;

/// Result type for analysis runs.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised while loading activity or computing a report.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Loading or validating source data failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// A report could not be computed
    #[error(transparent)]
    Engine(#[from] EngineError),
}
