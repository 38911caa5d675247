use super::Agent;
use crate::attrition::{AttritionModel, AttritionReport, FeatureImportance, ModelStore, SharedAttritionModel};
use crate::config::AppConfig;
use crate::error::Result;
use crate::training::ModelMetrics;
use polars::prelude::DataFrame;

/// Scores attrition risk per employee, training the model on first use
#[derive(Debug, Clone)]
pub struct AttritionAgent {
    model: SharedAttritionModel,
}

impl AttritionAgent {
    pub fn new(model: SharedAttritionModel) -> Self {
        Self { model }
    }

    /// Agent backed by the configured model directory, warm-started from it
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = config
            .model
            .persist
            .then(|| ModelStore::new(&config.paths.model_dir));
        let model = SharedAttritionModel::new(AttritionModel::from_app_config(config), store);
        model.warm_start()?;
        Ok(Self::new(model))
    }

    pub fn model(&self) -> &SharedAttritionModel {
        &self.model
    }

    pub fn train(&self, df: &DataFrame) -> Result<ModelMetrics> {
        self.model.train(df)
    }

    pub fn feature_importance(&self) -> Result<Vec<FeatureImportance>> {
        self.model.feature_importance()
    }
}

impl Agent for AttritionAgent {
    type Request = DataFrame;
    type Report = AttritionReport;

    fn name(&self) -> &'static str {
        "attrition"
    }

    fn description(&self) -> &'static str {
        "Attrition risk per employee with model metrics and feature importance"
    }

    fn run(&self, df: &DataFrame) -> Result<AttritionReport> {
        self.model.analyze(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::ResultStore;
    use crate::synthetic::HrDataGenerator;

    #[test]
    fn test_run_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.model.n_estimators = 6;
        config.paths.model_dir = dir.path().join("models");

        let agent = AttritionAgent::from_config(&config).unwrap();
        assert!(!agent.model().is_trained());

        let df = HrDataGenerator::new(21).generate(70).unwrap();
        let store = ResultStore::new(dir.path().join("results"));
        let report = agent.run_and_save(&df, &store).unwrap();
        assert_eq!(report.risk_scores.len(), 70);
        assert!(dir.path().join("results/attrition.json").exists());
        assert!(dir.path().join("models/attrition_model.json").exists());

        let reloaded = AttritionAgent::from_config(&config).unwrap();
        assert!(reloaded.model().is_trained());
    }
}
