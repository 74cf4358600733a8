//! Human-readable summaries of the periodic growth accounting report.

use crate::export::GrowthAccountingExport;
use accrete_engine::GrowthAccountingRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tabular summary of a growth accounting run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthSummary {
    /// Title shown above the table.
    pub title: String,

    /// One entry per reported period.
    pub rows: Vec<GrowthAccountingExport>,
}

impl GrowthSummary {
    /// Build a summary from engine rows.
    pub fn new(title: impl Into<String>, rows: &[GrowthAccountingRow]) -> Self {
        Self {
            title: title.into(),
            rows: rows.iter().map(GrowthAccountingExport::from).collect(),
        }
    }

    /// Granularity of the summarized periods, if any were reported.
    pub fn granularity(&self) -> Option<&str> {
        self.rows.first().map(|r| r.granularity.as_str())
    }

    /// Total revenue across all reported periods.
    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    /// Render as a fixed-width ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nGrowth Accounting: {}\n", self.title));
        if let (Some(first), Some(last)) = (self.rows.first(), self.rows.last()) {
            output.push_str(&format!(
                "Periods: {} to {} ({})\n",
                first.period, last.period, first.granularity
            ));
        }
        output.push_str(&"=".repeat(112));
        output.push('\n');

        output.push_str(&format!(
            "{:<12} {:>8} {:>7} {:>9} {:>8} {:>8} {:>14} {:>9} {:>9} {:>9} {:>9}\n",
            "Period",
            "Active",
            "New",
            "Retained",
            "Resurr.",
            "Churned",
            "Revenue",
            "User QR",
            "User Ret",
            "Rev QR",
            "Rev Ret"
        ));
        output.push_str(&"-".repeat(112));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<12} {:>8} {:>7} {:>9} {:>8} {:>8} {:>14.2} {:>9} {:>9} {:>9} {:>9}\n",
                row.period.to_string(),
                row.active_users,
                row.new_users,
                row.retained_users,
                row.resurrected_users,
                row.churned_users,
                row.revenue,
                format_ratio(row.user_quick_ratio),
                format_pct(row.user_retention),
                format_ratio(row.revenue_quick_ratio),
                format_pct(row.revenue_retention),
            ));
        }

        output.push_str(&"=".repeat(112));
        output.push('\n');
        output.push_str(&format!(
            "Total revenue: {:.2} over {} periods\n",
            self.total_revenue(),
            self.rows.len()
        ));
        output
    }

    /// Render as a Markdown document.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Growth Accounting: {}\n\n", self.title));
        if let Some(granularity) = self.granularity() {
            output.push_str(&format!("**Granularity:** {granularity}\n\n"));
        }

        output.push_str(
            "| Period | Active | New | Retained | Resurrected | Churned | Revenue | User QR | User Retention | Revenue QR | Revenue Retention |\n",
        );
        output.push_str(
            "|--------|--------|-----|----------|-------------|---------|---------|---------|----------------|------------|-------------------|\n",
        );
        for row in &self.rows {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {:.2} | {} | {} | {} | {} |\n",
                row.period,
                row.active_users,
                row.new_users,
                row.retained_users,
                row.resurrected_users,
                row.churned_users,
                row.revenue,
                format_ratio(row.user_quick_ratio),
                format_pct(row.user_retention),
                format_ratio(row.revenue_quick_ratio),
                format_pct(row.revenue_retention),
            ));
        }
        output
    }
}

impl fmt::Display for GrowthSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}

fn format_ratio(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "n/a".to_string()
    }
}

fn format_pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}%", value * 100.0)
    } else {
        "n/a".to_string()
    }
}
