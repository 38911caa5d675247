//! JSON persistence of trained attrition models

use super::model::TrainedModel;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MODEL_FILE: &str = "attrition_model.json";

/// Stores the trained model as `attrition_model.json` in a directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, model: &TrainedModel) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        let json = serde_json::to_string(model)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), "Saved attrition model");
        Ok(path)
    }

    /// Load the stored model, if any
    pub fn load(&self) -> Result<Option<TrainedModel>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Load the stored model; unreadable files count as absent
    pub fn load_readable(&self) -> Option<TrainedModel> {
        match self.load() {
            Ok(model) => model,
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "Ignoring unreadable model file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrition::AttritionModel;
    use crate::config::AppConfig;
    use crate::synthetic::HrDataGenerator;

    fn trained() -> TrainedModel {
        let mut config = AppConfig::default();
        config.model.n_estimators = 5;
        let df = HrDataGenerator::new(11).generate(50).unwrap();
        let mut model = AttritionModel::from_app_config(&config);
        model.train(&df).unwrap().clone()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        assert!(store.load().unwrap().is_none());

        let model = trained();
        store.save(&model).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.fingerprint, model.fingerprint);
        assert_eq!(loaded.feature_names, model.feature_names);
    }

    #[test]
    fn test_reloaded_model_scores_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let mut config = AppConfig::default();
        config.model.n_estimators = 10;
        let df = HrDataGenerator::new(4).generate(120).unwrap();

        let mut model = AttritionModel::from_app_config(&config);
        store.save(model.train(&df).unwrap()).unwrap();
        let before = model.predict_risk(&df).unwrap();

        let mut reloaded = AttritionModel::from_app_config(&config);
        reloaded.install(store.load().unwrap().unwrap());
        assert_eq!(before, reloaded.predict_risk(&df).unwrap());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_err());
        assert!(store.load_readable().is_none());
    }
}
