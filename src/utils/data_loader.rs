//! Data loading utilities

use crate::config::DataConfig;
use crate::error::{Result, WorkforceError};
use crate::schema::ValidationReport;
use polars::prelude::*;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Columns allowed to be mostly empty
const SPARSE_COLUMNS: [&str; 1] = ["TerminationDate"];

/// Reads employee tables and applies the configured input checks
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    config: DataConfig,
}

impl DataLoader {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    /// Read an HR table from a CSV file and validate it
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let df = self.read_csv(path)?;
        self.validate(&df)?;
        Ok(df)
    }

    /// Read any CSV file, subject only to the size limit
    pub fn read_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.check_size(size)?;

        let start = Instant::now();
        let df = csv_options().into_reader_with_file_handle(File::open(path)?).finish()?;
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );
        Ok(df)
    }

    /// Read an uploaded CSV body
    pub fn read_csv_bytes(&self, bytes: Vec<u8>) -> Result<DataFrame> {
        self.check_size(bytes.len() as u64)?;
        Ok(csv_options().into_reader_with_file_handle(Cursor::new(bytes)).finish()?)
    }

    /// Schema check followed by the missing-value check
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        self.config.schema.validate(df)?;
        self.check_missing(df).map(|_| ())
    }

    /// Columns whose share of nulls exceeds `max_missing_values`.
    ///
    /// In strict mode any such column is an error; otherwise they are logged
    /// and returned.
    pub fn check_missing(&self, df: &DataFrame) -> Result<Vec<String>> {
        if df.height() == 0 {
            return Ok(Vec::new());
        }
        let rows = df.height() as f64;
        let sparse: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| !SPARSE_COLUMNS.contains(&c.name().as_str()))
            .filter(|c| c.null_count() as f64 / rows > self.config.max_missing_values)
            .map(|c| c.name().to_string())
            .collect();

        if sparse.is_empty() {
            return Ok(sparse);
        }
        if self.config.validation_strict {
            return Err(WorkforceError::Validation(ValidationReport {
                violations: vec![format!(
                    "columns with too many missing values: [{}]",
                    sparse.join(", ")
                )],
                ..Default::default()
            }));
        }
        warn!(columns = ?sparse, "Columns with high missing values");
        Ok(sparse)
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.config.max_upload_size {
            return Err(WorkforceError::InvalidInput(format!(
                "file size {} exceeds maximum allowed size of {:.1}MB",
                size,
                self.config.max_upload_size as f64 / (1024.0 * 1024.0)
            )));
        }
        Ok(())
    }
}

fn csv_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
}

/// Write a table as CSV with a header row
pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!(path = %path.display(), rows = df.height(), "Saved CSV");
    Ok(())
}

/// Build a table from a JSON object of equal-length column arrays.
///
/// Each column takes the narrowest type that holds all its non-null values:
/// integer, float, boolean, or string (anything else is rendered as text).
pub fn frame_from_columns(columns: &Map<String, Value>) -> Result<DataFrame> {
    let mut height = None;
    let mut out = Vec::with_capacity(columns.len());
    for (name, values) in columns {
        let Value::Array(values) = values else {
            return Err(WorkforceError::InvalidInput(format!(
                "column {name} must be an array"
            )));
        };
        match height {
            None => height = Some(values.len()),
            Some(h) if h != values.len() => {
                return Err(WorkforceError::InvalidInput(format!(
                    "column {} has {} values, expected {}",
                    name,
                    values.len(),
                    h
                )))
            }
            Some(_) => {}
        }
        out.push(json_column(name, values));
    }
    Ok(DataFrame::new(out)?)
}

fn json_column(name: &str, values: &[Value]) -> Column {
    let present = || values.iter().filter(|v| !v.is_null());
    let name: PlSmallStr = name.into();

    if present().next().is_none() {
        Column::full_null(name, values.len(), &DataType::Null)
    } else if present().all(|v| v.is_i64()) {
        Column::new(name, values.iter().map(Value::as_i64).collect::<Vec<_>>())
    } else if present().all(Value::is_number) {
        Column::new(name, values.iter().map(Value::as_f64).collect::<Vec<_>>())
    } else if present().all(Value::is_boolean) {
        Column::new(name, values.iter().map(Value::as_bool).collect::<Vec<_>>())
    } else {
        let text: Vec<Option<String>> = values
            .iter()
            .map(|v| match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(name, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::HrDataGenerator;
    use serde_json::json;

    #[test]
    fn test_csv_round_trip_keeps_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hr.csv");
        let mut df = HrDataGenerator::new(3).generate(40).unwrap();
        save_csv(&mut df, &path).unwrap();

        let loaded = DataLoader::default().load(&path).unwrap();
        assert_eq!(loaded.height(), 40);
        assert_eq!(loaded.column("HireDate").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_size_limit() {
        let config = DataConfig {
            max_upload_size: 8,
            ..Default::default()
        };
        let err = DataLoader::new(config)
            .read_csv_bytes(b"a,b\n1,2\n3,4\n".to_vec())
            .unwrap_err();
        assert!(matches!(err, WorkforceError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_ratio() {
        let df = df!(
            "a" => &[Some(1i64), None, None, Some(4)],
            "TerminationDate" => &[None::<&str>, None, None, None],
        )
        .unwrap();
        let strict = DataLoader::default();
        assert!(strict.check_missing(&df).is_err());

        let lenient = DataLoader::new(DataConfig {
            validation_strict: false,
            ..Default::default()
        });
        assert_eq!(lenient.check_missing(&df).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn test_frame_from_columns() {
        let body = json!({
            "id": [1, 2, 3],
            "score": [1.5, 2, null],
            "leader": [true, false, true],
            "name": ["a", null, 7],
        });
        let df = frame_from_columns(body.as_object().unwrap()).unwrap();
        assert_eq!(df.shape(), (3, 4));
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("leader").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("name").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("score").unwrap().null_count(), 1);
    }

    #[test]
    fn test_all_null_json_column_has_null_dtype() {
        let body = json!({ "id": [1, 2], "TerminationDate": [null, null] });
        let df = frame_from_columns(body.as_object().unwrap()).unwrap();
        let column = df.column("TerminationDate").unwrap();
        assert_eq!(column.dtype(), &DataType::Null);
        assert_eq!(column.null_count(), 2);
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let body = json!({"a": [1, 2], "b": [1]});
        assert!(frame_from_columns(body.as_object().unwrap()).is_err());
    }
}
