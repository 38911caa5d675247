//! Model training
//!
//! A Gini decision tree and the bagged random forest built from it, plus the
//! seeded stratified split and the binary classification metrics used to
//! evaluate a trained attrition model.

pub mod decision_tree;
pub mod metrics;
pub mod random_forest;
pub mod split;

pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::{roc_auc, ModelMetrics};
pub use random_forest::{MaxFeatures, RandomForest};
pub use split::{stratified_split, Split};
