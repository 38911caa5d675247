//! Preprocessing configuration

use super::{EncoderType, ImputeStrategy, ScalerType};
use crate::schema::{ColumnType, DataSchema};
use serde::{Deserialize, Serialize};

/// A preprocessing step. Steps always run in declaration order of this enum,
/// whatever order the configuration lists them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStep {
    HandleMissingValues,
    ConvertDates,
    EncodeCategorical,
    ScaleNumeric,
}

impl PreprocessingStep {
    pub const ALL: [PreprocessingStep; 4] = [
        PreprocessingStep::HandleMissingValues,
        PreprocessingStep::ConvertDates,
        PreprocessingStep::EncodeCategorical,
        PreprocessingStep::ScaleNumeric,
    ];
}

/// Configuration for the preprocessing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Enabled steps
    pub steps: Vec<PreprocessingStep>,

    /// Numeric feature columns. Empty means "derive from the schema or data".
    pub numeric_columns: Vec<String>,

    /// Categorical feature columns. Empty means "derive from the schema or data".
    pub categorical_columns: Vec<String>,

    /// Date columns converted to days since 1970-01-01
    pub date_columns: Vec<String>,

    /// Columns never used as features (identifier, label, leaky columns)
    pub exclude_columns: Vec<String>,

    /// Strategy for missing numeric values
    pub numeric_impute: ImputeStrategy,

    pub encoding: EncoderType,

    pub scaler: ScalerType,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            steps: PreprocessingStep::ALL.to_vec(),
            numeric_columns: Vec::new(),
            categorical_columns: Vec::new(),
            date_columns: Vec::new(),
            exclude_columns: vec![
                "EmployeeNumber".to_string(),
                "Attrition".to_string(),
                "TerminationDate".to_string(),
            ],
            numeric_impute: ImputeStrategy::Mean,
            encoding: EncoderType::OneHot,
            scaler: ScalerType::Standard,
        }
    }
}

impl PreprocessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute = strategy;
        self
    }

    pub fn with_encoding(mut self, encoding: EncoderType) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_scaler(mut self, scaler: ScalerType) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_steps(mut self, steps: &[PreprocessingStep]) -> Self {
        self.steps = steps.to_vec();
        self
    }

    pub fn with_numeric_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.numeric_columns = to_strings(columns);
        self
    }

    pub fn with_categorical_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.categorical_columns = to_strings(columns);
        self
    }

    pub fn with_date_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.date_columns = to_strings(columns);
        self
    }

    pub fn with_exclude<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.exclude_columns = to_strings(columns);
        self
    }

    pub fn is_enabled(&self, step: PreprocessingStep) -> bool {
        self.steps.contains(&step)
    }

    /// Fill empty column lists from the schema's declared types.
    ///
    /// Excluded columns are removed from every list, including lists that
    /// were given explicitly.
    pub fn resolved_for(&self, schema: &DataSchema) -> Self {
        let mut config = self.clone();
        if config.numeric_columns.is_empty() {
            config.numeric_columns = schema.columns_of_type(ColumnType::Integer);
            config
                .numeric_columns
                .extend(schema.columns_of_type(ColumnType::Float));
            config
                .numeric_columns
                .extend(schema.columns_of_type(ColumnType::Boolean));
        }
        if config.categorical_columns.is_empty() {
            config.categorical_columns = schema.columns_of_type(ColumnType::String);
        }
        if config.date_columns.is_empty() {
            config.date_columns = schema.columns_of_type(ColumnType::DateTime);
        }
        config.drop_excluded();
        config
    }

    pub(crate) fn drop_excluded(&mut self) {
        let exclude = self.exclude_columns.clone();
        for list in [
            &mut self.numeric_columns,
            &mut self.categorical_columns,
            &mut self.date_columns,
        ] {
            list.retain(|c| !exclude.contains(c));
        }
    }
}

fn to_strings<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns.iter().map(|c| c.as_ref().to_string()).collect()
}
