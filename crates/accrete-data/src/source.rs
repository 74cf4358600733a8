//! Reading activity from tabular sources.

use crate::binding::FieldBinding;
use crate::error::{DataError, Result};
use accrete_engine::{ActivityRecord, DailyActivity};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Date layouts tried, in order, after any explicit format.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Date-time layouts tried after the date layouts; the time part is discarded.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Read a CSV file with a header row into a DataFrame.
///
/// Every column is read as it is inferred from the full file; dates stay as
/// strings and are parsed later against the binding.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    read_csv_with(path.as_ref(), None)
}

/// Read a CSV file, forcing the bound identifier, date and segment columns to text.
///
/// Amounts are still inferred. Identifiers such as `007` and `7` stay distinct.
pub fn read_activity_csv(path: impl AsRef<Path>, binding: &FieldBinding) -> Result<DataFrame> {
    let path = path.as_ref();
    let header = csv_header(path)?;

    let mut text = Schema::with_capacity(3);
    for name in binding.text_columns() {
        if !header.iter().any(|h| h == name) {
            return Err(DataError::schema(name, "column not found"));
        }
        text.with_column(name.into(), DataType::String);
    }
    read_csv_with(path, Some(Arc::new(text)))
}

fn csv_header(path: &Path) -> Result<Vec<String>> {
    ensure_exists(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(Some(1))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect())
}

fn read_csv_with(path: &Path, text: Option<SchemaRef>) -> Result<DataFrame> {
    ensure_exists(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_schema_overwrite(text)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), "read csv");
    Ok(df)
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    Err(DataError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )))
}

/// Parse a single activity date.
///
/// An explicit `format` is tried first. Date-time values are truncated to
/// their calendar date.
pub fn parse_activity_date(value: &str, format: Option<&str>) -> Option<NaiveDate> {
    let value = value.trim();
    if let Some(format) = format {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Convert the bound columns of a DataFrame into activity records.
///
/// Rows with a null amount carry no activity and are skipped, but only after
/// their user id and date are checked. A null user id or an unparseable date
/// aborts the whole batch.
pub fn records_from_frame(df: &DataFrame, binding: &FieldBinding) -> Result<Vec<ActivityRecord>> {
    binding.validate(df)?;

    let users = df.column(&binding.user_id)?.cast(&DataType::String)?;
    let users = users.str()?;
    let dates = df.column(&binding.activity_date)?.cast(&DataType::String)?;
    let dates = dates.str()?;
    let amounts = df.column(&binding.amount)?.cast(&DataType::Float64)?;
    let amounts = amounts.f64()?;
    let segments = match &binding.segment {
        Some(name) => Some(df.column(name)?.cast(&DataType::String)?),
        None => None,
    };
    let segments = segments.as_ref().map(|s| s.str()).transpose()?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let user_id = users.get(i).ok_or_else(|| DataError::Parse {
            row: i,
            field: binding.user_id.clone(),
            value: "null".to_string(),
        })?;
        let raw_date = dates.get(i).ok_or_else(|| DataError::Parse {
            row: i,
            field: binding.activity_date.clone(),
            value: "null".to_string(),
        })?;
        let activity_date = parse_activity_date(raw_date, binding.date_format.as_deref())
            .ok_or_else(|| DataError::Parse {
                row: i,
                field: binding.activity_date.clone(),
                value: raw_date.to_string(),
            })?;
        let Some(amount) = amounts.get(i) else {
            continue;
        };

        let mut record = ActivityRecord::new(user_id, activity_date, amount);
        if let Some(segment) = segments.and_then(|s| s.get(i)) {
            record = record.with_segment(segment);
        }
        records.push(record);
    }

    Ok(records)
}

/// Load a DataFrame into aggregated daily activity.
///
/// Segments are kept when the binding names a segment column.
pub fn load_activity(df: &DataFrame, binding: &FieldBinding) -> Result<DailyActivity> {
    let records = records_from_frame(df, binding)?;
    let source_rows = records.len();
    let daily = DailyActivity::from_records(records, binding.segment.is_some())?;

    info!(
        source_rows,
        users = daily.user_count(),
        first_date = %daily.first_date(),
        last_date = %daily.last_date(),
        "loaded activity"
    );
    Ok(daily)
}

/// Read and load a CSV file in one step.
pub fn load_activity_csv(path: impl AsRef<Path>, binding: &FieldBinding) -> Result<DailyActivity> {
    let df = read_activity_csv(path, binding)?;
    load_activity(&df, binding)
}
