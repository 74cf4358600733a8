#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/accrete/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{
    CohortExport, ExportError, ExportFormat, Exporter, FrequencyExport, GrowthAccountingExport,
    RollingWindowExport, ThresholdExport, to_export,
};
pub use report::{Report, ReportBuilder, ReportError};
pub use summary::GrowthSummary;
