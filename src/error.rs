//! Error types for workforce analytics

use crate::schema::ValidationReport;
use thiserror::Error;

/// Result type alias for workforce operations
pub type Result<T> = std::result::Result<T, WorkforceError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum WorkforceError {
    #[error("Validation error: {0}")]
    Validation(ValidationReport),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Input table is empty")]
    EmptyInput,

    #[error("Degenerate label: column '{column}' has {n_classes} class(es), need at least 2")]
    DegenerateLabel { column: String, n_classes: usize },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl WorkforceError {
    /// True for errors caused by the caller's data rather than by the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkforceError::Validation(_)
                | WorkforceError::InvalidInput(_)
                | WorkforceError::EmptyInput
                | WorkforceError::DegenerateLabel { .. }
                | WorkforceError::FeatureNotFound(_)
                | WorkforceError::InvalidParameter { .. }
        )
    }
}

impl From<ValidationReport> for WorkforceError {
    fn from(report: ValidationReport) -> Self {
        WorkforceError::Validation(report)
    }
}

impl From<polars::error::PolarsError> for WorkforceError {
    fn from(err: polars::error::PolarsError) -> Self {
        WorkforceError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for WorkforceError {
    fn from(err: serde_json::Error) -> Self {
        WorkforceError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for WorkforceError {
    fn from(err: serde_yaml::Error) -> Self {
        WorkforceError::ConfigError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for WorkforceError {
    fn from(err: ndarray::ShapeError) -> Self {
        WorkforceError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
