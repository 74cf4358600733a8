#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/accrete/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod binding;
pub mod error;
pub mod source;

pub use binding::FieldBinding;
pub use error::{DataError, Result};
pub use source::{
    load_activity, load_activity_csv, parse_activity_date, read_activity_csv, read_csv,
    records_from_frame,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
