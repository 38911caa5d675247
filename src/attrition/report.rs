//! Attrition result records

use crate::training::ModelMetrics;
use serde::{Deserialize, Serialize};

/// Risk score of one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    #[serde(rename = "EmployeeNumber")]
    pub employee_id: String,
    pub attrition_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Summary statistics of a set of scores, laid out like a describe() table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; undefined for fewer than two scores
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl RiskDistribution {
    pub fn describe(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            count,
            mean: Some(mean),
            std,
            min: sorted.first().copied(),
            p25: Some(quantile(&sorted, 0.25)),
            p50: Some(quantile(&sorted, 0.5)),
            p75: Some(quantile(&sorted, 0.75)),
            max: sorted.last().copied(),
        }
    }
}

/// Linear-interpolation quantile of sorted, non-empty data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionMetrics {
    /// Employees whose risk is strictly above `threshold`
    pub high_risk_count: usize,
    pub avg_risk: f64,
    pub risk_distribution: RiskDistribution,
    pub threshold: f64,
    /// Holdout evaluation of the model that produced the scores
    pub model: ModelMetrics,
}

/// Output of an attrition analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionReport {
    /// One score per input row, in input order
    pub risk_scores: Vec<RiskScore>,
    pub high_risk_employees: Vec<RiskScore>,
    pub metrics: AttritionMetrics,
    /// Descending by importance
    pub feature_importance: Vec<FeatureImportance>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let d = RiskDistribution::describe(&[0.4, 0.1, 0.3, 0.2]);
        assert_eq!(d.count, 4);
        assert!((d.mean.unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(d.min, Some(0.1));
        assert_eq!(d.max, Some(0.4));
        assert!((d.p50.unwrap() - 0.25).abs() < 1e-12);
        assert!((d.p25.unwrap() - 0.175).abs() < 1e-12);
        assert!((d.std.unwrap() - 0.129_099_444_873_580_55).abs() < 1e-12);
    }

    #[test]
    fn test_describe_edge_cases() {
        assert_eq!(RiskDistribution::describe(&[]).count, 0);
        let single = RiskDistribution::describe(&[0.9]);
        assert_eq!(single.std, None);
        assert_eq!(single.p75, Some(0.9));
    }

    #[test]
    fn test_serialized_quantile_keys() {
        let json = serde_json::to_value(RiskDistribution::describe(&[0.5])).unwrap();
        assert!(json.get("25%").is_some());
        assert!(json.get("50%").is_some());
    }
}
