//! Table schema declaration and validation
//!
//! A [`DataSchema`] declares the columns an input table must carry, their
//! expected types and optional value constraints. [`DataSchema::validate`]
//! collects every problem it finds into a [`ValidationReport`] instead of
//! stopping at the first one, so callers can show the full list.

mod hr;

pub use hr::{hr_schema, DEPARTMENTS, EDUCATION_FIELDS, JOB_ROLES};

use crate::error::{Result, WorkforceError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    #[serde(alias = "date")]
    DateTime,
    Boolean,
}

impl ColumnType {
    /// Whether a polars dtype can hold values of this declared type
    pub fn accepts(&self, dtype: &DataType) -> bool {
        if matches!(dtype, DataType::Null) {
            return true;
        }
        match self {
            ColumnType::Integer => is_integer_dtype(dtype),
            ColumnType::Float => is_integer_dtype(dtype) || is_float_dtype(dtype),
            ColumnType::String => matches!(dtype, DataType::String | DataType::Categorical(_, _)),
            // String dates are parsed later by the preprocessor
            ColumnType::DateTime => matches!(
                dtype,
                DataType::Date | DataType::Datetime(_, _) | DataType::String
            ),
            ColumnType::Boolean => matches!(dtype, DataType::Boolean),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::DateTime => "datetime",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

pub(crate) fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

pub(crate) fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Definition of a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

fn default_required() -> bool {
    true
}

impl ColumnDefinition {
    /// Create a required column with no value constraints
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            required: true,
            description: None,
            allowed_values: None,
            min_value: None,
            max_value: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_allowed<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.as_ref().to_string()).collect());
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }
}

/// A column whose dtype does not match its declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub expected: ColumnType,
    pub actual: String,
}

/// Everything wrong with a table, gathered in one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing_columns: Vec<String>,
    pub mismatched_columns: Vec<ColumnMismatch>,
    pub violations: Vec<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.missing_columns.is_empty()
            && self.mismatched_columns.is_empty()
            && self.violations.is_empty()
    }

    /// Turn a non-empty report into an error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(WorkforceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing_columns.is_empty() {
            parts.push(format!(
                "missing required columns: [{}]",
                self.missing_columns.join(", ")
            ));
        }
        for m in &self.mismatched_columns {
            parts.push(format!(
                "column {} has incorrect type: expected {}, got {}",
                m.column, m.expected, m.actual
            ));
        }
        parts.extend(self.violations.iter().cloned());
        f.write_str(&parts.join("; "))
    }
}

/// Schema for a tabular dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSchema {
    pub columns: Vec<ColumnDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl DataSchema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self {
            columns,
            primary_key: None,
            version: default_version(),
        }
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.required)
    }

    /// Columns declared with the given type, in declaration order
    pub fn columns_of_type(&self, column_type: ColumnType) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.column_type == column_type)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Check presence and types only
    pub fn check_structure(&self, df: &DataFrame) -> ValidationReport {
        let mut report = ValidationReport::default();
        for def in &self.columns {
            match df.column(&def.name) {
                Ok(column) => {
                    let all_null = column.null_count() == column.len();
                    if !all_null && !def.column_type.accepts(column.dtype()) {
                        report.mismatched_columns.push(ColumnMismatch {
                            column: def.name.clone(),
                            expected: def.column_type,
                            actual: column.dtype().to_string(),
                        });
                    }
                }
                Err(_) if def.required => report.missing_columns.push(def.name.clone()),
                Err(_) => {}
            }
        }
        report
    }

    /// Full validation: structure, value constraints and key uniqueness
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        self.report(df)?.into_result()
    }

    /// Build the validation report without converting it into an error
    pub fn report(&self, df: &DataFrame) -> Result<ValidationReport> {
        let mut report = self.check_structure(df);
        if df.height() == 0 {
            report.violations.push("table has no rows".to_string());
            return Ok(report);
        }

        let mismatched: HashSet<&str> = report
            .mismatched_columns
            .iter()
            .map(|m| m.column.as_str())
            .collect();

        for def in &self.columns {
            if mismatched.contains(def.name.as_str()) {
                continue;
            }
            let Ok(column) = df.column(&def.name) else {
                continue;
            };
            if column.null_count() == column.len() {
                continue;
            }
            let series = column.as_materialized_series();
            if let Some(allowed) = &def.allowed_values {
                check_allowed_values(&def.name, series, allowed, &mut report.violations)?;
            }
            if def.column_type.is_numeric() {
                check_range(def, series, &mut report.violations)?;
            }
        }

        if let Some(key) = &self.primary_key {
            if let Ok(column) = df.column(key) {
                check_unique(key, column.as_materialized_series(), &mut report.violations)?;
            }
        }

        Ok(report)
    }
}

fn check_allowed_values(
    name: &str,
    series: &Series,
    allowed: &[String],
    violations: &mut Vec<String>,
) -> Result<()> {
    let as_str = series.cast(&DataType::String)?;
    let ca = as_str.str()?;
    let mut invalid: Vec<String> = Vec::new();
    for value in ca.into_iter().flatten() {
        if !allowed.iter().any(|a| a == value) && !invalid.iter().any(|v| v == value) {
            invalid.push(value.to_string());
        }
    }
    if !invalid.is_empty() {
        violations.push(format!(
            "column {} contains invalid values: [{}]",
            name,
            invalid.join(", ")
        ));
    }
    Ok(())
}

fn check_range(def: &ColumnDefinition, series: &Series, violations: &mut Vec<String>) -> Result<()> {
    if def.min_value.is_none() && def.max_value.is_none() {
        return Ok(());
    }
    let as_f64 = series.cast(&DataType::Float64)?;
    let ca = as_f64.f64()?;
    if let Some(min) = def.min_value {
        if ca.into_iter().flatten().any(|v| v < min) {
            violations.push(format!(
                "column {} contains values below minimum {}",
                def.name, min
            ));
        }
    }
    if let Some(max) = def.max_value {
        if ca.into_iter().flatten().any(|v| v > max) {
            violations.push(format!(
                "column {} contains values above maximum {}",
                def.name, max
            ));
        }
    }
    Ok(())
}

fn check_unique(name: &str, series: &Series, violations: &mut Vec<String>) -> Result<()> {
    let as_str = series.cast(&DataType::String)?;
    let ca = as_str.str()?;
    let mut seen = HashSet::with_capacity(ca.len());
    let mut duplicates: Vec<String> = Vec::new();
    let mut nulls = 0usize;
    for value in ca.into_iter() {
        match value {
            Some(v) => {
                if !seen.insert(v) && !duplicates.iter().any(|d| d == v) {
                    duplicates.push(v.to_string());
                }
            }
            None => nulls += 1,
        }
    }
    if nulls > 0 {
        violations.push(format!("key column {} contains {} null value(s)", name, nulls));
    }
    if !duplicates.is_empty() {
        violations.push(format!(
            "key column {} contains duplicate values: [{}]",
            name,
            duplicates.join(", ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_schema() -> DataSchema {
        DataSchema::new(vec![
            ColumnDefinition::new("id", ColumnType::Integer).with_min(1.0),
            ColumnDefinition::new("team", ColumnType::String).with_allowed(&["A", "B"]),
            ColumnDefinition::new("score", ColumnType::Float).with_range(0.0, 10.0),
            ColumnDefinition::new("left_on", ColumnType::DateTime).optional(),
        ])
        .with_primary_key("id")
    }

    #[test]
    fn test_valid_table_passes() {
        let df = df!(
            "id" => &[1i64, 2, 3],
            "team" => &["A", "B", "A"],
            "score" => &[1.5, 9.0, 4.0],
        )
        .unwrap();
        assert!(small_schema().validate(&df).is_ok());
    }

    #[test]
    fn test_missing_column_is_named() {
        let df = df!(
            "id" => &[1i64, 2],
            "score" => &[1.0, 2.0],
        )
        .unwrap();
        let err = small_schema().validate(&df).unwrap_err();
        match err {
            WorkforceError::Validation(report) => {
                assert_eq!(report.missing_columns, vec!["team".to_string()]);
                assert!(report.to_string().contains("team"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_mismatch_reported() {
        let df = df!(
            "id" => &["x", "y"],
            "team" => &["A", "B"],
            "score" => &[1.0, 2.0],
        )
        .unwrap();
        let report = small_schema().report(&df).unwrap();
        assert_eq!(report.mismatched_columns.len(), 1);
        assert_eq!(report.mismatched_columns[0].column, "id");
    }

    #[test]
    fn test_value_constraints() {
        let df = df!(
            "id" => &[1i64, 1],
            "team" => &["A", "Z"],
            "score" => &[-1.0, 11.0],
        )
        .unwrap();
        let report = small_schema().report(&df).unwrap();
        let text = report.to_string();
        assert!(text.contains("invalid values: [Z]"));
        assert!(text.contains("below minimum"));
        assert!(text.contains("above maximum"));
        assert!(text.contains("duplicate values: [1]"));
    }

    #[test]
    fn test_all_null_column_fits_any_type() {
        let mut df = df!(
            "id" => &[1i64, 2, 3],
            "team" => &["A", "B", "A"],
            "score" => &[1.5, 9.0, 4.0],
        )
        .unwrap();
        df.with_column(Column::full_null("left_on".into(), 3, &DataType::Int64))
            .unwrap();
        assert!(small_schema().validate(&df).is_ok());

        df.with_column(Column::full_null("score".into(), 3, &DataType::String))
            .unwrap();
        assert!(small_schema().validate(&df).is_ok());
    }

    #[test]
    fn test_categorical_accepted_as_string() {
        let team = Series::new("team".into(), &["A", "B"])
            .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))
            .unwrap();
        assert!(ColumnType::String.accepts(team.dtype()));
        assert!(!ColumnType::Integer.accepts(team.dtype()));
    }

    #[test]
    fn test_integer_accepted_as_float() {
        assert!(ColumnType::Float.accepts(&DataType::Int64));
        assert!(!ColumnType::Integer.accepts(&DataType::Float64));
        assert!(ColumnType::DateTime.accepts(&DataType::String));
        assert!(ColumnType::String.accepts(&DataType::Null));
    }

    #[test]
    fn test_schema_yaml_round_trip() {
        let schema = small_schema();
        let yaml = serde_yaml::to_string(&schema).unwrap();
        assert!(yaml.contains("type: integer"));
        let parsed: DataSchema = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, schema);
    }
}
