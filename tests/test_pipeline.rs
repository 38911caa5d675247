//! Integration test: generate → save → load → validate → preprocess → train → analyze

use polars::prelude::*;
use workforce_analytics::attrition::{AttritionModel, SharedAttritionModel};
use workforce_analytics::config::AppConfig;
use workforce_analytics::preprocessing::{Preprocessor, PreprocessingConfig};
use workforce_analytics::synthetic::HrDataGenerator;
use workforce_analytics::utils::{save_csv, DataLoader};
use workforce_analytics::WorkforceError;

fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.model.n_estimators = 15;
    config.model.max_depth = Some(6);
    config.model.persist = false;
    config
}

#[test]
fn test_csv_to_risk_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hr.csv");
    let mut generated = HrDataGenerator::new(11).generate(300).unwrap();
    save_csv(&mut generated, &path).unwrap();

    let config = fast_config();
    let df = DataLoader::new(config.data.clone()).load(&path).unwrap();
    assert_eq!(df.height(), 300);

    let mut model = AttritionModel::from_app_config(&config);
    let trained = model.train(&df).unwrap();
    assert!(trained.metrics.accuracy.is_some());

    let report = model.analyze(&df).unwrap();
    assert_eq!(report.risk_scores.len(), 300);
    assert!(report
        .risk_scores
        .iter()
        .all(|s| (0.0..=1.0).contains(&s.attrition_risk)));

    let ids: std::collections::HashSet<_> = report.risk_scores.iter().map(|s| s.employee_id.as_str()).collect();
    assert_eq!(ids.len(), 300);

    // High-risk employees are exactly those strictly above the threshold
    let threshold = config.model.prediction_threshold;
    let expected = report.risk_scores.iter().filter(|s| s.attrition_risk > threshold).count();
    assert_eq!(report.high_risk_employees.len(), expected);
    assert_eq!(report.metrics.high_risk_count, expected);
}

#[test]
fn test_feature_importance_is_normalised_and_ranked() {
    let df = HrDataGenerator::new(5).generate(250).unwrap();
    let mut model = AttritionModel::from_app_config(&fast_config());
    model.train(&df).unwrap();

    let importance = model.feature_importance().unwrap();
    let total: f64 = importance.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-6, "importances sum to {}", total);
    assert!(importance.windows(2).all(|w| w[0].importance >= w[1].importance));
}

#[test]
fn test_preprocessing_is_repeatable() {
    let df = HrDataGenerator::new(8).generate(120).unwrap();
    let mut preprocessor = Preprocessor::new(PreprocessingConfig::default());
    preprocessor.fit(&df).unwrap();

    let first = preprocessor.transform_matrix(&df, "EmployeeNumber").unwrap();
    let second = preprocessor.transform_matrix(&df, "EmployeeNumber").unwrap();
    assert_eq!(first.n_rows(), 120);
    assert_eq!(first, second);
}

#[test]
fn test_missing_column_is_named() {
    let df = HrDataGenerator::new(1).generate(30).unwrap().drop("Salary").unwrap();
    let err = DataLoader::default().validate(&df).unwrap_err();
    match err {
        WorkforceError::Validation(report) => assert_eq!(report.missing_columns, vec!["Salary".to_string()]),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_shared_model_persists_between_instances() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config();
    config.model.persist = true;
    config.paths.model_dir = dir.path().join("models");
    let df = HrDataGenerator::new(21).generate(200).unwrap();

    let store = || Some(workforce_analytics::attrition::ModelStore::new(&config.paths.model_dir));
    let first = SharedAttritionModel::new(AttritionModel::from_app_config(&config), store());
    let report = first.analyze(&df).unwrap();

    let second = SharedAttritionModel::new(AttritionModel::from_app_config(&config), store());
    assert!(second.warm_start().unwrap());
    let again = second.analyze(&df).unwrap();
    assert_eq!(report.risk_scores, again.risk_scores);
}

#[test]
fn test_degenerate_labels_are_rejected() {
    let df = HrDataGenerator::new(2).generate(60).unwrap();
    let stayed = Column::new("Attrition".into(), vec!["No"; 60]);
    let mut df = df;
    df.with_column(stayed).unwrap();

    let mut model = AttritionModel::from_app_config(&fast_config());
    assert!(matches!(
        model.train(&df),
        Err(WorkforceError::DegenerateLabel { n_classes: 1, .. })
    ));
}
