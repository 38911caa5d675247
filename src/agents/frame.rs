//! Lenient column readers shared by the aggregation agents

use crate::error::{Result, WorkforceError};
use crate::preprocessing::dates::column_datetimes;
use crate::preprocessing::numeric_values;
use crate::schema::ValidationReport;
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Fail with a validation report naming every absent column
pub(crate) fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|c| df.column(c).is_err())
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkforceError::Validation(ValidationReport {
            missing_columns: missing,
            ..Default::default()
        }))
    }
}

/// Values rendered as text; `None` when the column is absent
pub(crate) fn strings(df: &DataFrame, column: &str) -> Result<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(column) else {
        return Ok(None);
    };
    let as_str = column.as_materialized_series().cast(&DataType::String)?;
    Ok(Some(
        as_str
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect(),
    ))
}

pub(crate) fn floats(df: &DataFrame, column: &str) -> Result<Option<Vec<Option<f64>>>> {
    match df.column(column) {
        Ok(column) => numeric_values(column.as_materialized_series()).map(Some),
        Err(_) => Ok(None),
    }
}

/// Truthiness of booleans, non-zero numbers and yes/true/1 strings
pub(crate) fn flags(df: &DataFrame, column: &str) -> Result<Option<Vec<bool>>> {
    Ok(strings(df, column)?.map(|values| {
        values
            .iter()
            .map(|v| {
                v.as_deref().is_some_and(|s| {
                    let s = s.trim().to_ascii_lowercase();
                    matches!(s.as_str(), "true" | "yes" | "y")
                        || s.parse::<f64>().is_ok_and(|n| n != 0.0)
                })
            })
            .collect()
    }))
}

pub(crate) fn timestamps(df: &DataFrame, column: &str) -> Result<Option<Vec<Option<NaiveDateTime>>>> {
    match df.column(column) {
        Ok(column) => column_datetimes(column.as_materialized_series()).map(Some),
        Err(_) => Ok(None),
    }
}

/// Median of a non-empty slice
pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
