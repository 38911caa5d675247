//! Application configuration
//!
//! One YAML document drives the whole application. Every section has defaults
//! matching the stock HR dataset, so an empty file (or no file at all) is a
//! valid configuration. A handful of environment variables override paths and
//! the log level after the file is read.

use crate::agents::{DiversityColumns, PlanningConfig, ProductivityConfig, SimulationConfig, SkillsConfig};
use crate::error::{Result, WorkforceError};
use crate::preprocessing::PreprocessingConfig;
use crate::schema::{hr_schema, DataSchema};
use crate::training::MaxFeatures;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub preprocessing: PreprocessingConfig,
    pub model: ModelConfig,
    pub paths: PathConfig,
    pub logging: LoggingConfig,
    pub diversity: DiversityColumns,
    pub skills: SkillsConfig,
    pub planning: PlanningConfig,
    pub simulation: SimulationConfig,
    pub productivity: ProductivityConfig,
}

/// Input data contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub schema: DataSchema,
    /// Employee identifier column
    pub id_column: String,
    /// Binary attrition label column
    pub label_column: String,
    /// Reject tables whose missing-value ratio exceeds `max_missing_values`
    pub validation_strict: bool,
    pub max_missing_values: f64,
    /// Largest CSV file the loader accepts, in bytes
    pub max_upload_size: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            schema: hr_schema(),
            id_column: "EmployeeNumber".to_string(),
            label_column: "Attrition".to_string(),
            validation_strict: true,
            max_missing_values: 0.1,
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

/// Random forest hyperparameters and scoring policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    pub random_state: u64,
    /// Scores strictly above this are "high risk"
    pub prediction_threshold: f64,
    /// Persist trained models under `paths.model_dir`
    pub persist: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            test_size: 0.2,
            random_state: 42,
            prediction_threshold: 0.7,
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models"),
            results_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as YAML
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_yaml::to_string(self)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `WORKFORCE_DATA_DIR`, `WORKFORCE_MODEL_DIR`, `WORKFORCE_RESULTS_DIR`, `LOG_LEVEL`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("WORKFORCE_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("WORKFORCE_MODEL_DIR") {
            self.paths.model_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("WORKFORCE_RESULTS_DIR") {
            self.paths.results_dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if model.n_estimators == 0 {
            return Err(invalid("model.n_estimators", &model.n_estimators, "must be positive"));
        }
        if !(0.0..1.0).contains(&model.test_size) {
            return Err(invalid("model.test_size", &model.test_size, "must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&model.prediction_threshold) {
            return Err(invalid(
                "model.prediction_threshold",
                &model.prediction_threshold,
                "must be in [0, 1]",
            ));
        }
        if model.min_samples_split < 2 {
            return Err(invalid("model.min_samples_split", &model.min_samples_split, "must be at least 2"));
        }
        if !(0.0..=1.0).contains(&self.data.max_missing_values) {
            return Err(invalid(
                "data.max_missing_values",
                &self.data.max_missing_values,
                "must be in [0, 1]",
            ));
        }
        if self.data.schema.column(&self.data.id_column).is_none() {
            return Err(WorkforceError::ConfigError(format!(
                "id column '{}' is not declared in the schema",
                self.data.id_column
            )));
        }
        if self.data.schema.column(&self.data.label_column).is_none() {
            return Err(WorkforceError::ConfigError(format!(
                "label column '{}' is not declared in the schema",
                self.data.label_column
            )));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: &dyn std::fmt::Display, reason: &str) -> WorkforceError {
    WorkforceError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
