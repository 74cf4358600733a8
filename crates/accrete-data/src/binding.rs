//! Mapping of logical activity roles to source column names.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Source column names for each activity role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBinding {
    /// Column holding the user identifier.
    pub user_id: String,

    /// Column holding the activity date.
    pub activity_date: String,

    /// Column holding the signed activity amount.
    pub amount: String,

    /// Optional column holding a segment label.
    pub segment: Option<String>,

    /// Explicit chrono format for `activity_date`, tried before the built-in formats.
    pub date_format: Option<String>,
}

impl Default for FieldBinding {
    fn default() -> Self {
        Self {
            user_id: "user_id".to_string(),
            activity_date: "activity_date".to_string(),
            amount: "inc_amt".to_string(),
            segment: None,
            date_format: None,
        }
    }
}

impl FieldBinding {
    /// Set the user column.
    pub fn with_user_id(mut self, column: impl Into<String>) -> Self {
        self.user_id = column.into();
        self
    }

    /// Set the activity date column.
    pub fn with_activity_date(mut self, column: impl Into<String>) -> Self {
        self.activity_date = column.into();
        self
    }

    /// Set the amount column.
    pub fn with_amount(mut self, column: impl Into<String>) -> Self {
        self.amount = column.into();
        self
    }

    /// Bind a segment column.
    pub fn with_segment(mut self, column: impl Into<String>) -> Self {
        self.segment = Some(column.into());
        self
    }

    /// Set an explicit date format.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Names of every bound column, required ones first.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.user_id.as_str(),
            self.activity_date.as_str(),
            self.amount.as_str(),
        ];
        if let Some(segment) = &self.segment {
            columns.push(segment);
        }
        columns
    }

    /// Bound columns read as text: user id, activity date and segment.
    pub fn text_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.user_id.as_str(), self.activity_date.as_str()];
        if let Some(segment) = &self.segment {
            columns.push(segment);
        }
        columns
    }

    /// Check that every bound column exists and that the amount column is numeric.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        for name in self.columns() {
            if name.is_empty() {
                return Err(DataError::schema(name, "empty column name in binding"));
            }
            if df.column(name).is_err() {
                return Err(DataError::schema(name, "column not found"));
            }
        }

        let amount = df.column(&self.amount)?;
        match amount.dtype() {
            DataType::String => {
                let numeric = amount.cast(&DataType::Float64)?;
                if numeric.null_count() > amount.null_count() {
                    return Err(DataError::schema(&self.amount, "values are not numeric"));
                }
            }
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => {}
            dtype => {
                return Err(DataError::schema(
                    &self.amount,
                    format!("expected a numeric column, found {dtype}"),
                ));
            }
        }
        Ok(())
    }
}
