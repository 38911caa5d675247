//! Thread-safe attrition model, loaded or trained once and shared by readers

use super::model::AttritionModel;
use super::report::{AttritionReport, FeatureImportance};
use super::store::ModelStore;
use crate::error::Result;
use crate::training::ModelMetrics;
use parking_lot::{RwLock, RwLockWriteGuard};
use polars::prelude::DataFrame;
use std::sync::Arc;
use tracing::info;

/// An [`AttritionModel`] shared between threads.
///
/// Readers score concurrently. Scoring never replaces an installed model:
/// the first analysis without one loads the stored model, or trains on the
/// table and persists it, under a single writer while the others wait. Later
/// data only reaches the model through [`SharedAttritionModel::train`].
#[derive(Debug, Clone)]
pub struct SharedAttritionModel {
    inner: Arc<RwLock<AttritionModel>>,
    store: Option<ModelStore>,
}

impl SharedAttritionModel {
    pub fn new(model: AttritionModel, store: Option<ModelStore>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
            store,
        }
    }

    /// Install whatever model the store holds, regardless of fingerprint
    pub fn warm_start(&self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        match store.load()? {
            Some(state) => {
                info!(trained_at = %state.trained_at, "Loaded stored attrition model");
                self.inner.write().install(state);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().is_trained()
    }

    /// Train on `df` unconditionally and persist the result
    pub fn train(&self, df: &DataFrame) -> Result<ModelMetrics> {
        let mut guard = self.inner.write();
        let metrics = guard.train(df)?.metrics.clone();
        self.persist(&guard)?;
        Ok(metrics)
    }

    /// Analyse `df` with the installed model, training on `df` only when no
    /// model is installed and the store holds none
    pub fn analyze(&self, df: &DataFrame) -> Result<AttritionReport> {
        {
            let guard = self.inner.read();
            if guard.is_trained() {
                return guard.analyze(df);
            }
            guard.validate_input(df)?;
        }

        let mut guard = self.inner.write();
        // another writer may have caught up while we waited
        if !guard.is_trained() {
            match self.store.as_ref().and_then(ModelStore::load_readable) {
                Some(state) => {
                    info!(trained_at = %state.trained_at, "Loaded stored attrition model");
                    guard.install(state);
                }
                None => {
                    guard.train(df)?;
                    self.persist(&guard)?;
                }
            }
        }
        let guard = RwLockWriteGuard::downgrade(guard);
        guard.analyze(df)
    }

    pub fn feature_importance(&self) -> Result<Vec<FeatureImportance>> {
        self.inner.read().feature_importance()
    }

    fn persist(&self, model: &AttritionModel) -> Result<()> {
        if let (Some(store), Some(state)) = (&self.store, model.trained()) {
            if model.config().persist {
                store.save(state)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::WorkforceError;
    use crate::synthetic::HrDataGenerator;
    use polars::prelude::ChunkCompareEq;

    fn shared(store: Option<ModelStore>) -> SharedAttritionModel {
        let mut config = AppConfig::default();
        config.model.n_estimators = 8;
        SharedAttritionModel::new(AttritionModel::from_app_config(&config), store)
    }

    #[test]
    fn test_analyze_trains_on_first_use() {
        let model = shared(None);
        assert!(!model.is_trained());
        assert!(matches!(model.feature_importance(), Err(WorkforceError::ModelNotFitted)));

        let df = HrDataGenerator::new(2).generate(80).unwrap();
        let report = model.analyze(&df).unwrap();
        assert_eq!(report.risk_scores.len(), 80);
        assert!(model.is_trained());
        assert!(!model.feature_importance().unwrap().is_empty());
    }

    #[test]
    fn test_persisted_model_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let df = HrDataGenerator::new(4).generate(60).unwrap();

        let first = shared(Some(ModelStore::new(dir.path())));
        let a = first.analyze(&df).unwrap();
        assert!(dir.path().join("attrition_model.json").exists());

        let second = shared(Some(ModelStore::new(dir.path())));
        assert!(second.warm_start().unwrap());
        let b = second.analyze(&df).unwrap();
        assert_eq!(a.risk_scores, b.risk_scores);
    }

    #[test]
    fn test_current_staff_are_scored_by_installed_model() {
        let model = shared(None);
        let df = HrDataGenerator::new(7).generate(300).unwrap();
        model.train(&df).unwrap();

        let mask = df
            .column("Attrition")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .equal("No");
        let current = df.filter(&mask).unwrap();
        assert!(current.height() > 0);
        let report = model.analyze(&current).unwrap();
        assert_eq!(report.risk_scores.len(), current.height());
    }

    #[test]
    fn test_small_sample_keeps_stored_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = shared(Some(ModelStore::new(dir.path())));
        let df = HrDataGenerator::new(7).generate(300).unwrap();
        let n_train = model.train(&df).unwrap().n_train;
        let saved = std::fs::read_to_string(dir.path().join("attrition_model.json")).unwrap();

        let report = model.analyze(&df.head(Some(12))).unwrap();
        assert_eq!(report.risk_scores.len(), 12);
        assert_eq!(report.metrics.model.n_train, n_train);
        let after = std::fs::read_to_string(dir.path().join("attrition_model.json")).unwrap();
        assert_eq!(saved, after);
    }

    #[test]
    fn test_first_analysis_loads_stored_model() {
        let dir = tempfile::tempdir().unwrap();
        let df = HrDataGenerator::new(9).generate(200).unwrap();
        let trained = shared(Some(ModelStore::new(dir.path())));
        let n_train = trained.train(&df).unwrap().n_train;

        // no warm start: the first analysis must still pick up the stored model
        let fresh = shared(Some(ModelStore::new(dir.path())));
        let report = fresh.analyze(&df.head(Some(10))).unwrap();
        assert_eq!(report.metrics.model.n_train, n_train);
    }

    #[test]
    fn test_concurrent_readers() {
        let model = shared(None);
        let df = HrDataGenerator::new(8).generate(60).unwrap();
        model.train(&df).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let model = model.clone();
                let df = df.clone();
                std::thread::spawn(move || model.analyze(&df).map(|r| r.risk_scores.len()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 60);
        }
    }
}
