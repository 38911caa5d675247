//! Date column conversion
//!
//! Dates become a single numeric feature: days since 1970-01-01. Native
//! polars `Date`/`Datetime` columns are cast, string columns are parsed with
//! a small set of common layouts.

use crate::error::{Result, WorkforceError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a date or datetime string, keeping only the calendar date
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Parse a datetime string; plain dates map to midnight
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn days_since_epoch(date: NaiveDate) -> i64 {
    (date - NaiveDate::default()).num_days()
}

/// Day numbers of a column, whatever its storage type
pub fn column_days(series: &Series) -> Result<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let as_date = series.cast(&DataType::Date)?;
            let days = as_date.cast(&DataType::Int32)?;
            Ok(days.i32()?.into_iter().map(|d| d.map(f64::from)).collect())
        }
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_date).map(|d| days_since_epoch(d) as f64))
            .collect()),
        DataType::Null => Ok(vec![None; series.len()]),
        other => Err(WorkforceError::PreprocessingError(format!(
            "column {} has type {} and cannot be read as dates",
            series.name(),
            other
        ))),
    }
}

/// Timestamps of a column, whatever its storage type. Dates map to midnight.
pub fn column_datetimes(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    match series.dtype() {
        DataType::Date | DataType::Datetime(_, _) => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            Ok(millis
                .i64()?
                .into_iter()
                .map(|v| v.and_then(DateTime::from_timestamp_millis).map(|dt| dt.naive_utc()))
                .collect())
        }
        DataType::String => Ok(series.str()?.into_iter().map(|v| v.and_then(parse_datetime)).collect()),
        DataType::Null => Ok(vec![None; series.len()]),
        other => Err(WorkforceError::PreprocessingError(format!(
            "column {} has type {} and cannot be read as timestamps",
            series.name(),
            other
        ))),
    }
}

/// Converts date columns to day numbers, filling gaps with the fitted mean day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateConverter {
    mean_days: BTreeMap<String, f64>,
    is_fitted: bool,
}

impl DateConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for name in columns {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let days = column_days(column.as_materialized_series())?;
            let (sum, n) = days
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, n), d| (s + d, n + 1));
            let mean = if n == 0 { 0.0 } else { (sum / n as f64).round() };
            self.mean_days.insert(name.clone(), mean);
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace each fitted date column with a Float64 day-number column
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(WorkforceError::ModelNotFitted);
        }
        let mut result = df.clone();
        for (name, mean) in &self.mean_days {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();
            let ca: Float64Chunked = column_days(series)?
                .into_iter()
                .map(|d| Some(d.unwrap_or(*mean)))
                .collect();
            result.with_column(ca.with_name(series.name().clone()).into_series())?;
        }
        Ok(result)
    }

    pub fn mean_day(&self, column: &str) -> Option<f64> {
        self.mean_days.get(column).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(parse_date("2021-03-14"), Some(expected));
        assert_eq!(parse_date("2021-03-14 08:30:00"), Some(expected));
        assert_eq!(parse_date("2021-03-14T08:30:00Z"), Some(expected));
        assert_eq!(parse_date("03/14/2021"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_column_datetimes() {
        let s = Series::new("t".into(), &[Some("2024-01-02 10:30:00"), None, Some("2024-01-03")]);
        let values = column_datetimes(&s).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(values[0], day.and_hms_opt(10, 30, 0));
        assert_eq!(values[1], None);
        assert_eq!(values[2], day.succ_opt().unwrap().and_hms_opt(0, 0, 0));

        let dates = Series::new("d".into(), &[19_724i32]).cast(&DataType::Date).unwrap();
        assert_eq!(column_datetimes(&dates).unwrap()[0], day.and_hms_opt(0, 0, 0));
    }

    #[test]
    fn test_epoch_days() {
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()), 1);
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
    }

    #[test]
    fn test_string_column_with_gaps() {
        let df = df!(
            "hired" => &[Some("1970-01-01"), None, Some("1970-01-11"), Some("garbage")],
        )
        .unwrap();
        let mut converter = DateConverter::new();
        converter.fit(&df, &["hired".to_string()]).unwrap();
        assert_eq!(converter.mean_day("hired"), Some(5.0));

        let out = converter.transform(&df).unwrap();
        let days: Vec<f64> = out
            .column("hired")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(days, vec![0.0, 5.0, 10.0, 5.0]);
    }

    #[test]
    fn test_native_date_column() {
        let dates = [
            NaiveDate::from_ymd_opt(1970, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(1970, 1, 5).unwrap(),
        ];
        let df = df!("d" => &dates).unwrap();
        let days = column_days(df.column("d").unwrap().as_materialized_series()).unwrap();
        assert_eq!(days, vec![Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_numeric_column_rejected() {
        let df = df!("d" => &[1i32, 2]).unwrap();
        assert!(column_days(df.column("d").unwrap().as_materialized_series()).is_err());
    }
}
