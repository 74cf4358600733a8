//! Writing reports to stdout or a file.

use accrete_output::{ExportFormat, Exporter, ReportBuilder};
use clap::ValueEnum;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;

/// Output formats accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Csv,
    Json,
    PrettyJson,
    Table,
    Markdown,
}

impl OutputFormat {
    /// The export format for row-oriented output, if this is one.
    pub(crate) const fn export_format(self) -> Option<ExportFormat> {
        match self {
            Self::Csv => Some(ExportFormat::Csv),
            Self::Json => Some(ExportFormat::Json),
            Self::PrettyJson => Some(ExportFormat::PrettyJson),
            Self::Table | Self::Markdown => None,
        }
    }
}

/// Where and how a report is written.
#[derive(Debug, Clone)]
pub(crate) struct OutputTarget {
    pub(crate) path: Option<PathBuf>,
    pub(crate) format: OutputFormat,
    pub(crate) envelope: bool,
}

/// Write report rows in a row-oriented format.
///
/// With `envelope` the rows are wrapped in a timestamped JSON report that also
/// records `parameters`.
pub(crate) fn write_rows<R, P>(
    kind: &str,
    rows: &R,
    parameters: &P,
    target: &OutputTarget,
) -> Result<(), Box<dyn Error>>
where
    R: Exporter + Serialize,
    P: Serialize,
{
    let format = target
        .format
        .export_format()
        .ok_or_else(|| format!("{kind} reports support csv, json and pretty-json output"))?;

    if target.envelope {
        let report = ReportBuilder::new()
            .kind(kind)
            .parameters(parameters)?
            .rows(rows)?
            .build()?;
        let text = match format {
            ExportFormat::Json => report.to_json()?,
            ExportFormat::PrettyJson => report.to_pretty_json()?,
            ExportFormat::Csv => return Err("--envelope requires json or pretty-json".into()),
        };
        return emit(&text, target.path.as_deref());
    }

    match &target.path {
        Some(path) => {
            rows.export_to_file(path, format)?;
            info!(path = %path.display(), "wrote {kind} report");
        }
        None => print!("{}", rows.export_to_string(format)?),
    }
    Ok(())
}

/// Write already rendered text.
pub(crate) fn emit(text: &str, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(path = %path.display(), "wrote report");
        }
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
