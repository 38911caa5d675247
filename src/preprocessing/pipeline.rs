//! Preprocessing pipeline: impute, convert dates, encode, scale

use super::{
    config::{PreprocessingConfig, PreprocessingStep},
    dates::DateConverter,
    encoder::Encoder,
    imputer::{numeric_values, Imputer},
    scaler::Scaler,
};
use crate::error::{Result, WorkforceError};
use crate::schema::{is_float_dtype, is_integer_dtype};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Numeric feature matrix, one row per employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Row identifiers, as strings, when the id column was present
    pub employee_ids: Vec<String>,
    pub feature_names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

/// Everything learned by [`Preprocessor::fit`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorState {
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub imputer: Option<Imputer>,
    pub dates: Option<DateConverter>,
    pub encoder: Option<Encoder>,
    pub scaler: Option<Scaler>,
    pub feature_names: Vec<String>,
}

/// Turns a raw employee table into a numeric feature matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    config: PreprocessingConfig,
    state: Option<PreprocessorState>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(PreprocessingConfig::default())
    }
}

impl Preprocessor {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config, state: None }
    }

    /// Rebuild a fitted preprocessor from saved state
    pub fn from_state(config: PreprocessingConfig, state: PreprocessorState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&PreprocessorState> {
        self.state.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Output feature names, in matrix column order
    pub fn feature_names(&self) -> Result<&[String]> {
        self.state
            .as_ref()
            .map(|s| s.feature_names.as_slice())
            .ok_or(WorkforceError::ModelNotFitted)
    }

    /// Learn imputation values, date means, category sets and scaler statistics
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let start = Instant::now();
        let (numeric, categorical, dates) = self.resolve_columns(df);
        let config = &self.config;

        let mut state = PreprocessorState {
            numeric_columns: numeric,
            categorical_columns: categorical,
            date_columns: dates,
            imputer: None,
            dates: None,
            encoder: None,
            scaler: None,
            feature_names: Vec::new(),
        };

        // Each stage is fitted on the output of the previous one
        let mut work = df.clone();
        if config.is_enabled(PreprocessingStep::HandleMissingValues) {
            let mut imputer = Imputer::new(config.numeric_impute);
            imputer.fit(&work, &state.numeric_columns, &state.categorical_columns)?;
            work = imputer.transform(&work)?;
            state.imputer = Some(imputer);
        }
        if config.is_enabled(PreprocessingStep::ConvertDates) {
            let mut converter = DateConverter::new();
            converter.fit(&work, &state.date_columns)?;
            work = converter.transform(&work)?;
            state.dates = Some(converter);
        }
        if config.is_enabled(PreprocessingStep::EncodeCategorical) {
            let mut encoder = Encoder::new(config.encoding);
            encoder.fit(&work, &state.categorical_columns)?;
            state.encoder = Some(encoder);
        }
        if config.is_enabled(PreprocessingStep::ScaleNumeric) {
            let mut scaler = Scaler::new(config.scaler);
            scaler.fit(&work, &state.numeric_columns)?;
            state.scaler = Some(scaler);
        }

        state.feature_names = feature_layout(&state);
        debug!(
            rows = df.height(),
            features = state.feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Preprocessor fitted"
        );
        self.state = Some(state);
        Ok(self)
    }

    /// Apply the fitted stages, returning a frame with exactly the feature
    /// columns, all Float64, in feature order
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let state = self.state.as_ref().ok_or(WorkforceError::ModelNotFitted)?;
        let height = df.height();

        let mut work = df.clone();
        if let Some(imputer) = &state.imputer {
            work = imputer.transform(&work)?;
        }
        if let Some(converter) = &state.dates {
            work = converter.transform(&work)?;
        }
        if let Some(scaler) = &state.scaler {
            work = scaler.transform(&work)?;
        }

        let mut columns: Vec<Column> = Vec::with_capacity(state.feature_names.len());
        for name in state.numeric_columns.iter().chain(&state.date_columns) {
            columns.push(float_column_or_zeros(&work, name, height)?);
        }
        if let Some(encoder) = &state.encoder {
            columns.extend(encoder.encode(&work)?);
        }

        Ok(DataFrame::new(columns)?)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Transform into a [`FeatureMatrix`], carrying ids from `id_column`
    pub fn transform_matrix(&self, df: &DataFrame, id_column: &str) -> Result<FeatureMatrix> {
        let features = self.transform(df)?;
        let feature_names = self.feature_names()?.to_vec();
        let values = columns_to_array2(&features, &feature_names)?;
        let employee_ids = match df.column(id_column) {
            Ok(column) => {
                let as_str = column.as_materialized_series().cast(&DataType::String)?;
                as_str
                    .str()?
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| v.map_or_else(|| format!("row-{i}"), str::to_string))
                    .collect()
            }
            Err(_) => (0..df.height()).map(|i| format!("row-{i}")).collect(),
        };
        Ok(FeatureMatrix {
            employee_ids,
            feature_names,
            values,
        })
    }

    /// Columns to use: configured lists when given, otherwise inferred from
    /// the frame's dtypes. Excluded columns never take part.
    fn resolve_columns(&self, df: &DataFrame) -> (Vec<String>, Vec<String>, Vec<String>) {
        let mut config = self.config.clone();
        let infer = |pred: fn(&DataType) -> bool| -> Vec<String> {
            df.get_columns()
                .iter()
                .filter(|c| pred(c.dtype()))
                .map(|c| c.name().to_string())
                .collect()
        };
        if config.numeric_columns.is_empty() {
            config.numeric_columns = infer(|d| is_integer_dtype(d) || is_float_dtype(d) || matches!(d, DataType::Boolean));
        }
        if config.categorical_columns.is_empty() {
            config.categorical_columns = infer(|d| matches!(d, DataType::String | DataType::Categorical(_, _)));
        }
        if config.date_columns.is_empty() {
            config.date_columns = infer(|d| matches!(d, DataType::Date | DataType::Datetime(_, _)));
        }
        // A string column named as a date is not also categorical
        let date_columns = config.date_columns.clone();
        config.categorical_columns.retain(|c| !date_columns.contains(c));
        config.drop_excluded();
        (config.numeric_columns, config.categorical_columns, config.date_columns)
    }
}

fn feature_layout(state: &PreprocessorState) -> Vec<String> {
    let mut names: Vec<String> = state
        .numeric_columns
        .iter()
        .chain(&state.date_columns)
        .cloned()
        .collect();
    if let Some(encoder) = &state.encoder {
        names.extend(encoder.feature_names());
    }
    names
}

/// Float64 copy of a column; nulls become 0.0 and an absent column is all zeros
fn float_column_or_zeros(df: &DataFrame, name: &str, height: usize) -> Result<Column> {
    let values: Vec<f64> = match df.column(name) {
        Ok(column) => match column.dtype() {
            DataType::Date | DataType::Datetime(_, _) | DataType::String => {
                super::dates::column_days(column.as_materialized_series())?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect()
            }
            _ => numeric_values(column.as_materialized_series())?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect(),
        },
        Err(_) => vec![0.0; height],
    };
    Ok(Column::new(name.into(), values))
}

/// Stack the named Float64 columns into a row-major matrix
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| WorkforceError::FeatureNotFound(col_name.clone()))?;
            Ok(numeric_values(column.as_materialized_series())?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect())
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}
