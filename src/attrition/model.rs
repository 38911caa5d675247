//! Attrition classifier: training, scoring and analysis

use super::report::{AttritionMetrics, AttritionReport, FeatureImportance, RiskDistribution, RiskScore};
use crate::config::{DataConfig, ModelConfig};
use crate::error::{Result, WorkforceError};
use crate::preprocessing::{PreprocessingConfig, Preprocessor};
use crate::schema::{ValidationReport, is_integer_dtype};
use crate::training::{stratified_split, ModelMetrics, RandomForest};
use chrono::{DateTime, Utc};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::{debug, info};

/// Everything needed to score new tables exactly as at training time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub forest: RandomForest,
    /// Fitted imputer, date, encoder and scaler state
    pub preprocessor: Preprocessor,
    pub feature_names: Vec<String>,
    /// SHA-256 of the training table
    pub fingerprint: String,
    pub metrics: ModelMetrics,
    pub trained_at: DateTime<Utc>,
}

/// Attrition risk model over an employee table
#[derive(Debug, Clone)]
pub struct AttritionModel {
    data: DataConfig,
    preprocessing: PreprocessingConfig,
    config: ModelConfig,
    state: Option<TrainedModel>,
}

impl AttritionModel {
    pub fn new(data: DataConfig, preprocessing: PreprocessingConfig, config: ModelConfig) -> Self {
        Self {
            data,
            preprocessing,
            config,
            state: None,
        }
    }

    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        Self::new(
            config.data.clone(),
            config.preprocessing.clone(),
            config.model.clone(),
        )
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    pub fn trained(&self) -> Option<&TrainedModel> {
        self.state.as_ref()
    }

    /// Install a previously trained state
    pub fn install(&mut self, state: TrainedModel) {
        self.state = Some(state);
    }

    /// Reject empty tables and tables that break the schema
    pub fn validate_input(&self, df: &DataFrame) -> Result<()> {
        if df.height() == 0 {
            return Err(WorkforceError::EmptyInput);
        }
        self.data.schema.validate(df)
    }

    /// Split, fit the preprocessor and forest on the training rows, and
    /// evaluate on the holdout rows
    pub fn train(&mut self, df: &DataFrame) -> Result<&TrainedModel> {
        let start = Instant::now();
        self.validate_input(df)?;

        let labels = encode_labels(df, &self.data.label_column)?;
        let n_classes = {
            let mut seen = [false; 2];
            labels.iter().for_each(|&l| seen[l] = true);
            seen.iter().filter(|&&s| s).count()
        };
        if n_classes < 2 {
            return Err(WorkforceError::DegenerateLabel {
                column: self.data.label_column.clone(),
                n_classes,
            });
        }

        let split = stratified_split(&labels, self.config.test_size, self.config.random_state);
        let train_df = take_rows(df, &split.train)?;
        let y_train: Array1<usize> = split.train.iter().map(|&i| labels[i]).collect();

        let mut preprocessor = Preprocessor::new(self.preprocessing_config());
        preprocessor.fit(&train_df)?;
        let x_train = preprocessor.transform_matrix(&train_df, &self.data.id_column)?;

        let mut forest = RandomForest::new(self.config.n_estimators)
            .with_max_depth(self.config.max_depth)
            .with_min_samples_split(self.config.min_samples_split)
            .with_min_samples_leaf(self.config.min_samples_leaf)
            .with_max_features(self.config.max_features)
            .with_random_state(self.config.random_state);
        forest.fit(&x_train.values, &y_train)?;

        let mut metrics = if split.holdout.is_empty() {
            ModelMetrics::new()
        } else {
            let holdout_df = take_rows(df, &split.holdout)?;
            let x_holdout = preprocessor.transform_matrix(&holdout_df, &self.data.id_column)?;
            let y_holdout: Vec<usize> = split.holdout.iter().map(|&i| labels[i]).collect();
            let proba = forest.predict_positive(&x_holdout.values)?;
            let predicted: Vec<usize> = forest.predict(&x_holdout.values)?.to_vec();
            ModelMetrics::compute_classification(&y_holdout, &predicted, proba.as_slice())
        };
        metrics.n_train = split.train.len();
        metrics.n_features = x_train.n_features();
        metrics.training_time_secs = start.elapsed().as_secs_f64();

        info!(
            rows = df.height(),
            train = metrics.n_train,
            holdout = metrics.n_holdout,
            features = metrics.n_features,
            accuracy = ?metrics.accuracy,
            auc = ?metrics.auc_roc,
            "Attrition model trained"
        );

        let state = TrainedModel {
            forest,
            feature_names: x_train.feature_names,
            preprocessor,
            fingerprint: table_fingerprint(df)?,
            metrics,
            trained_at: Utc::now(),
        };
        Ok(&*self.state.insert(state))
    }

    /// Probability of attrition per row, keyed by employee id
    pub fn predict_risk(&self, df: &DataFrame) -> Result<Vec<RiskScore>> {
        let state = self.state.as_ref().ok_or(WorkforceError::ModelNotFitted)?;
        let features = state
            .preprocessor
            .transform_matrix(df, &self.data.id_column)?;
        let risk = state.forest.predict_positive(&features.values)?;
        Ok(features
            .employee_ids
            .into_iter()
            .zip(risk.iter())
            .map(|(employee_id, &attrition_risk)| RiskScore {
                employee_id,
                attrition_risk,
            })
            .collect())
    }

    /// Per-feature importance, descending; ties keep feature order
    pub fn feature_importance(&self) -> Result<Vec<FeatureImportance>> {
        let state = self.state.as_ref().ok_or(WorkforceError::ModelNotFitted)?;
        let importances = state
            .forest
            .feature_importances()
            .ok_or(WorkforceError::ModelNotFitted)?;
        let mut ranked: Vec<FeatureImportance> = state
            .feature_names
            .iter()
            .zip(importances.iter())
            .map(|(feature, &importance)| FeatureImportance {
                feature: feature.clone(),
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Ok(ranked)
    }

    /// Score `df` with the trained model and summarise the result
    pub fn analyze(&self, df: &DataFrame) -> Result<AttritionReport> {
        self.validate_input(df)?;
        let state = self.state.as_ref().ok_or(WorkforceError::ModelNotFitted)?;

        let risk_scores = self.predict_risk(df)?;
        let threshold = self.config.prediction_threshold;
        let high_risk_employees: Vec<RiskScore> = risk_scores
            .iter()
            .filter(|r| r.attrition_risk > threshold)
            .cloned()
            .collect();

        let values: Vec<f64> = risk_scores.iter().map(|r| r.attrition_risk).collect();
        let risk_distribution = RiskDistribution::describe(&values);
        let metrics = AttritionMetrics {
            high_risk_count: high_risk_employees.len(),
            avg_risk: risk_distribution.mean.unwrap_or(0.0),
            risk_distribution,
            threshold,
            model: state.metrics.clone(),
        };
        debug!(
            rows = risk_scores.len(),
            high_risk = metrics.high_risk_count,
            "Attrition analysis complete"
        );

        Ok(AttritionReport {
            risk_scores,
            high_risk_employees,
            metrics,
            feature_importance: self.feature_importance()?,
        })
    }

    /// The configured preprocessing, with columns filled from the schema and
    /// the id and label columns always excluded
    fn preprocessing_config(&self) -> PreprocessingConfig {
        let mut config = self.preprocessing.clone();
        for column in [&self.data.id_column, &self.data.label_column] {
            if !config.exclude_columns.contains(column) {
                config.exclude_columns.push(column.clone());
            }
        }
        config.resolved_for(&self.data.schema)
    }
}

/// Map the label column to 0/1.
///
/// Strings accept yes/no, true/false and 1/0 in any case; integer columns
/// must hold 0 or 1; booleans map directly. Anything else, nulls included,
/// is a validation error naming the offending values.
pub fn encode_labels(df: &DataFrame, column: &str) -> Result<Vec<usize>> {
    let series = df
        .column(column)
        .map_err(|_| {
            WorkforceError::Validation(ValidationReport {
                missing_columns: vec![column.to_string()],
                ..Default::default()
            })
        })?
        .as_materialized_series();

    let dtype = series.dtype().clone();
    let as_str = if is_integer_dtype(&dtype) || matches!(dtype, DataType::Boolean) {
        series.cast(&DataType::String)?
    } else {
        series.clone()
    };
    let ca = as_str.str()?;

    let mut labels = Vec::with_capacity(ca.len());
    let mut invalid: Vec<String> = Vec::new();
    for value in ca.into_iter() {
        let label = value.and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => Some(1),
            "no" | "false" | "0" => Some(0),
            _ => None,
        });
        match label {
            Some(l) => labels.push(l),
            None => {
                let shown = value.unwrap_or("null").to_string();
                if !invalid.contains(&shown) {
                    invalid.push(shown);
                }
            }
        }
    }

    if invalid.is_empty() {
        Ok(labels)
    } else {
        Err(WorkforceError::Validation(ValidationReport {
            violations: vec![format!(
                "label column {} contains values that are not yes/no: [{}]",
                column,
                invalid.join(", ")
            )],
            ..Default::default()
        }))
    }
}

/// SHA-256 over column names, dtypes and every value, in table order
pub fn table_fingerprint(df: &DataFrame) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(df.height().to_le_bytes());
    for column in df.get_columns() {
        hasher.update(column.name().as_bytes());
        hasher.update([0x1f]);
        hasher.update(column.dtype().to_string().as_bytes());
        hasher.update([0x1e]);
        let as_str = column.as_materialized_series().cast(&DataType::String)?;
        for value in as_str.str()?.into_iter() {
            match value {
                Some(v) => {
                    hasher.update([0x01]);
                    hasher.update(v.as_bytes());
                }
                None => hasher.update([0x00]),
            }
            hasher.update([0x1f]);
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&i| i as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::synthetic::HrDataGenerator;

    fn small_model() -> AttritionModel {
        let mut config = AppConfig::default();
        config.model.n_estimators = 15;
        config.model.max_depth = Some(6);
        AttritionModel::from_app_config(&config)
    }

    #[test]
    fn test_label_encoding() {
        let df = df!("a" => &["Yes", "no", "TRUE", "0"]).unwrap();
        assert_eq!(encode_labels(&df, "a").unwrap(), vec![1, 0, 1, 0]);

        let df = df!("a" => &[1i64, 0, 1]).unwrap();
        assert_eq!(encode_labels(&df, "a").unwrap(), vec![1, 0, 1]);

        let df = df!("a" => &["Yes", "Maybe"]).unwrap();
        let err = encode_labels(&df, "a").unwrap_err();
        assert!(err.to_string().contains("Maybe"));
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = df!("x" => &[1i64, 2], "y" => &["a", "b"]).unwrap();
        let b = df!("x" => &[1i64, 2], "y" => &["a", "b"]).unwrap();
        let c = df!("x" => &[1i64, 3], "y" => &["a", "b"]).unwrap();
        assert_eq!(table_fingerprint(&a).unwrap(), table_fingerprint(&b).unwrap());
        assert_ne!(table_fingerprint(&a).unwrap(), table_fingerprint(&c).unwrap());
    }

    #[test]
    fn test_train_and_analyze() {
        let df = HrDataGenerator::new(42).generate(120).unwrap();
        let mut model = small_model();
        model.train(&df).unwrap();

        let report = model.analyze(&df).unwrap();
        assert_eq!(report.risk_scores.len(), 120);
        assert!(report
            .risk_scores
            .iter()
            .all(|r| (0.0..=1.0).contains(&r.attrition_risk)));
        assert!(report.high_risk_employees.iter().all(|r| r.attrition_risk > 0.7));
        assert_eq!(report.metrics.high_risk_count, report.high_risk_employees.len());

        let total: f64 = report.feature_importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(report
            .feature_importance
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn test_single_class_is_degenerate() {
        let mut df = HrDataGenerator::new(1).generate(30).unwrap();
        df.with_column(Column::new("Attrition".into(), vec!["No"; 30]))
            .unwrap();
        let err = small_model().train(&df).unwrap_err();
        assert!(matches!(err, WorkforceError::DegenerateLabel { n_classes: 1, .. }));
    }

    #[test]
    fn test_empty_input() {
        let df = HrDataGenerator::new(1).generate(10).unwrap().head(Some(0));
        assert!(matches!(small_model().train(&df), Err(WorkforceError::EmptyInput)));
    }

    #[test]
    fn test_analyze_requires_model() {
        let df = HrDataGenerator::new(3).generate(10).unwrap();
        assert!(matches!(small_model().analyze(&df), Err(WorkforceError::ModelNotFitted)));
    }
}
