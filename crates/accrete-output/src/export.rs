//! Export functionality for growth accounting reports.
//!
//! Every report is flattened into records with one scalar per column so it
//! can be written as CSV as well as JSON. Movement classes absent from a
//! period export as zero. Undefined ratios export as `NaN` in CSV and `null`
//! in JSON.

use accrete_engine::{
    CohortRow, FrequencyRow, GrowthAccountingRow, RevenueMovement, RollingWindowRow,
    UserMovement,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// One period of the consolidated growth accounting report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthAccountingExport {
    /// First day of the period.
    pub period: NaiveDate,

    /// Granularity name (`week` or `month`).
    pub granularity: String,

    /// Users active in the period.
    pub active_users: u64,

    /// Users whose first period this is.
    pub new_users: f64,

    /// Users active in this and the prior period.
    pub retained_users: f64,

    /// Returning users inactive in the prior period.
    pub resurrected_users: f64,

    /// Prior-period users inactive now (negative).
    pub churned_users: f64,

    /// Total revenue in the period.
    pub revenue: f64,

    /// Revenue from new users.
    pub new_revenue: f64,

    /// Σ min(current, prior) over retained users.
    pub retained_revenue: f64,

    /// Revenue from resurrected users.
    pub resurrected_revenue: f64,

    /// Revenue growth of retained users.
    pub expansion_revenue: f64,

    /// Revenue decline of retained users (negative).
    pub contraction_revenue: f64,

    /// Prior-period revenue of churned users (negative).
    pub churned_revenue: f64,

    /// Active users of the previous period.
    pub users_bop: Option<f64>,

    /// Retained users / users BOP.
    pub user_retention: f64,

    /// (new + resurrected) / |churned|
    pub user_quick_ratio: f64,

    /// Revenue of the previous period.
    pub revenue_bop: Option<f64>,

    /// Retained revenue / revenue BOP.
    pub revenue_retention: f64,

    /// (new + resurrected + expansion) / |churned + contraction|
    pub revenue_quick_ratio: f64,
}

impl From<&GrowthAccountingRow> for GrowthAccountingExport {
    fn from(row: &GrowthAccountingRow) -> Self {
        let users = &row.users;
        let revenue = &row.revenue_movements;
        Self {
            period: row.period.start(),
            granularity: row.period.granularity().name().to_string(),
            active_users: row.active_users,
            new_users: users.value_or_zero(UserMovement::New),
            retained_users: users.value_or_zero(UserMovement::Retained),
            resurrected_users: users.value_or_zero(UserMovement::Resurrected),
            churned_users: users.value_or_zero(UserMovement::Churned),
            revenue: row.revenue,
            new_revenue: revenue.value_or_zero(RevenueMovement::New),
            retained_revenue: revenue.value_or_zero(RevenueMovement::Retained),
            resurrected_revenue: revenue.value_or_zero(RevenueMovement::Resurrected),
            expansion_revenue: revenue.value_or_zero(RevenueMovement::Expansion),
            contraction_revenue: revenue.value_or_zero(RevenueMovement::Contraction),
            churned_revenue: revenue.value_or_zero(RevenueMovement::Churned),
            users_bop: row.ratios.users_bop,
            user_retention: row.ratios.user_retention,
            user_quick_ratio: row.ratios.user_quick_ratio,
            revenue_bop: row.ratios.revenue_bop,
            revenue_retention: row.ratios.revenue_retention,
            revenue_quick_ratio: row.ratios.revenue_quick_ratio,
        }
    }
}

/// One window of the rolling quick-ratio report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollingWindowExport {
    /// Last day of the window.
    pub window_end_date: NaiveDate,

    /// Window length in days.
    pub window_days: u32,

    /// Segment label, empty when unsegmented.
    pub segment: Option<String>,

    /// New users.
    pub new_users: f64,

    /// Retained users.
    pub retained_users: f64,

    /// Resurrected users.
    pub resurrected_users: f64,

    /// Churned users (negative).
    pub churned_users: f64,

    /// (new + resurrected) / |churned|
    pub user_quick_ratio: f64,

    /// retained / (retained + |churned|)
    pub user_retention_rate: f64,
}

impl From<&RollingWindowRow> for RollingWindowExport {
    fn from(row: &RollingWindowRow) -> Self {
        Self {
            window_end_date: row.window_end_date,
            window_days: row.window_days,
            segment: row.segment.clone(),
            new_users: row.users.value_or_zero(UserMovement::New),
            retained_users: row.users.value_or_zero(UserMovement::Retained),
            resurrected_users: row.users.value_or_zero(UserMovement::Resurrected),
            churned_users: row.users.value_or_zero(UserMovement::Churned),
            user_quick_ratio: row.user_quick_ratio,
            user_retention_rate: row.user_retention_rate,
        }
    }
}

/// One (cohort, period) cell of the cohort retention report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortExport {
    /// First day of the acquisition period.
    pub first_period: NaiveDate,

    /// First day of the reported period.
    pub period: NaiveDate,

    /// Periods since acquisition.
    pub periods_since_first: i64,

    /// Cohort spend in the period.
    pub spend: f64,

    /// Cohort spend to date.
    pub cumulative_spend: f64,

    /// Users acquired in the cohort period.
    pub cohort_size: u64,

    /// Cohort members active in the period.
    pub active_users: u64,

    /// active_users / cohort_size
    pub retention_pct: f64,

    /// cumulative_spend / cohort_size
    pub cumulative_spend_per_user: f64,
}

impl From<&CohortRow> for CohortExport {
    fn from(row: &CohortRow) -> Self {
        Self {
            first_period: row.first_period.start(),
            period: row.period.start(),
            periods_since_first: row.periods_since_first,
            spend: row.spend,
            cumulative_spend: row.cumulative_spend,
            cohort_size: row.cohort_size,
            active_users: row.active_users,
            retention_pct: row.retention_pct,
            cumulative_spend_per_user: row.cumulative_spend_per_user,
        }
    }
}

/// One window of the DAU/XAU frequency report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrequencyExport {
    /// Last day of the window.
    pub window_end_date: NaiveDate,

    /// Window length in days.
    pub window_days: u32,

    /// Distinct users active in the window.
    pub active_users: u64,

    /// Sum of active days over all users.
    pub total_active_days: u64,

    /// Mean share of window days a user was active.
    pub average_frequency_ratio: f64,

    /// Mean active days per user.
    pub window_frequency: f64,

    /// Users at or above each active-day threshold.
    pub breakouts: Vec<ThresholdExport>,
}

/// Users active on at least a given number of days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdExport {
    /// Minimum active days.
    pub min_active_days: u32,

    /// Users meeting the threshold.
    pub users: u64,

    /// Share of active users meeting the threshold.
    pub share: f64,
}

impl From<&FrequencyRow> for FrequencyExport {
    fn from(row: &FrequencyRow) -> Self {
        Self {
            window_end_date: row.window_end_date,
            window_days: row.window_days,
            active_users: row.active_users,
            total_active_days: row.total_active_days,
            average_frequency_ratio: row.average_frequency_ratio,
            window_frequency: row.window_frequency,
            breakouts: row
                .breakouts
                .iter()
                .map(|b| ThresholdExport {
                    min_active_days: b.min_active_days,
                    users: b.users,
                    share: b.share,
                })
                .collect(),
        }
    }
}

/// Convert engine rows into export records.
pub fn to_export<'a, R, E>(rows: &'a [R]) -> Vec<E>
where
    E: From<&'a R>,
{
    rows.iter().map(E::from).collect()
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn serialize_records<T: Serialize>(
    records: &[T],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for record in records {
                wtr.serialize(record)?;
            }
            Ok(String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?)?)
        }
        ExportFormat::Json => Ok(serde_json::to_string(records)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(records)?),
    }
}

impl Exporter for Vec<GrowthAccountingExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        serialize_records(self, format)
    }
}

impl Exporter for Vec<RollingWindowExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        serialize_records(self, format)
    }
}

impl Exporter for Vec<CohortExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        serialize_records(self, format)
    }
}

impl Exporter for Vec<FrequencyExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);

                let thresholds: Vec<u32> = self
                    .first()
                    .map(|row| row.breakouts.iter().map(|b| b.min_active_days).collect())
                    .unwrap_or_default();
                let mut header = vec![
                    "window_end_date".to_string(),
                    "window_days".to_string(),
                    "active_users".to_string(),
                    "total_active_days".to_string(),
                    "average_frequency_ratio".to_string(),
                    "window_frequency".to_string(),
                ];
                for k in &thresholds {
                    header.push(format!("{k}_day_users"));
                    header.push(format!("{k}_day_share"));
                }
                wtr.write_record(&header)?;

                for row in self {
                    if row.breakouts.len() != thresholds.len() {
                        return Err(ExportError::InvalidFormat(
                            "frequency rows have differing thresholds".to_string(),
                        ));
                    }
                    let mut record = vec![
                        row.window_end_date.to_string(),
                        row.window_days.to_string(),
                        row.active_users.to_string(),
                        row.total_active_days.to_string(),
                        row.average_frequency_ratio.to_string(),
                        row.window_frequency.to_string(),
                    ];
                    for breakout in &row.breakouts {
                        record.push(breakout.users.to_string());
                        record.push(breakout.share.to_string());
                    }
                    wtr.write_record(&record)?;
                }
                Ok(String::from_utf8(wtr.into_inner().map_err(|e| e.into_error())?)?)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accrete_engine::{
        ActivityRecord, DailyActivity, Granularity, GrowthConfig, growth_accounting,
    };
    use rstest::rstest;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn weekly_rows() -> Vec<GrowthAccountingExport> {
        let records = vec![
            ActivityRecord::new("a", date(1), 10.0),
            ActivityRecord::new("b", date(2), 5.0),
            ActivityRecord::new("a", date(8), 4.0),
        ];
        let daily = DailyActivity::from_records(records, false).unwrap();
        let config = GrowthConfig {
            granularity: Granularity::Week,
            drop_trailing_period: false,
        };
        to_export(&growth_accounting(&daily, &config).unwrap())
    }

    #[rstest]
    #[case("csv", ExportFormat::Csv)]
    #[case("JSON", ExportFormat::Json)]
    #[case("pretty-json", ExportFormat::PrettyJson)]
    fn test_format_from_str(#[case] input: &str, #[case] expected: ExportFormat) {
        assert_eq!(input.parse::<ExportFormat>().unwrap(), expected);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_growth_export_fields() {
        let rows = weekly_rows();
        assert_eq!(rows.len(), 2);

        let second = &rows[1];
        assert_eq!(second.period, date(8));
        assert_eq!(second.granularity, "week");
        assert_eq!(second.retained_users, 1.0);
        assert_eq!(second.churned_users, -1.0);
        assert_eq!(second.new_users, 0.0);
        assert_eq!(second.contraction_revenue, -6.0);
        assert_eq!(second.churned_revenue, -5.0);
        assert_eq!(second.users_bop, Some(2.0));
    }

    #[test]
    fn test_growth_export_csv() {
        let csv = weekly_rows().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("period,granularity,active_users,new_users"));
        assert!(header.ends_with("revenue_retention,revenue_quick_ratio"));
        assert_eq!(lines.count(), 2);
        // First period has no baseline
        assert!(csv.contains("NaN"));
    }

    #[test]
    fn test_growth_export_json_nan_is_null() {
        let json = weekly_rows().export_to_string(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value[0]["user_retention"].is_null());
        assert!(value[0]["users_bop"].is_null());
        assert_eq!(value[1]["users_bop"], 2.0);
    }

    #[test]
    fn test_frequency_csv_columns() {
        let rows = vec![FrequencyExport {
            window_end_date: date(28),
            window_days: 28,
            active_users: 4,
            total_active_days: 30,
            average_frequency_ratio: 30.0 / 28.0 / 4.0,
            window_frequency: 7.5,
            breakouts: vec![
                ThresholdExport {
                    min_active_days: 1,
                    users: 4,
                    share: 1.0,
                },
                ThresholdExport {
                    min_active_days: 14,
                    users: 1,
                    share: 0.25,
                },
            ],
        }];

        let csv = rows.export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "window_end_date,window_days,active_users,total_active_days,\
             average_frequency_ratio,window_frequency,1_day_users,1_day_share,\
             14_day_users,14_day_share"
        );
        let record = lines.next().unwrap();
        assert!(record.starts_with("2024-01-28,28,4,30,"));
        assert!(record.ends_with(",7.5,4,1,1,0.25"));
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join(format!("accrete-export-{}.csv", std::process::id()));
        weekly_rows().export_to_file(&path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("period,"));
        std::fs::remove_file(&path).unwrap();
    }
}
