#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/accrete/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod error;

// Re-export main types from sub-crates
pub use accrete_data as data;
pub use accrete_engine as engine;
pub use accrete_output as output;

pub use analysis::{Analysis, AnalysisResults};
pub use error::{AnalysisError, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
