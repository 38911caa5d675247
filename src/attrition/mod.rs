//! Attrition prediction
//!
//! A random forest over the preprocessed employee table, scored per employee,
//! summarised into a report, persisted as JSON and shared between threads.

mod model;
mod report;
mod shared;
mod store;

pub use model::{encode_labels, table_fingerprint, AttritionModel, TrainedModel};
pub use report::{AttritionMetrics, AttritionReport, FeatureImportance, RiskDistribution, RiskScore};
pub use shared::SharedAttritionModel;
pub use store::ModelStore;
