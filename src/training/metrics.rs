//! Binary classification metrics

use serde::{Deserialize, Serialize};

/// Holdout evaluation of a binary classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: Option<f64>,
    /// Undefined when the holdout contains a single class
    pub auc_roc: Option<f64>,
    pub training_time_secs: f64,
    pub n_features: usize,
    /// Rows used for training
    pub n_train: usize,
    /// Rows used for evaluation
    pub n_holdout: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute holdout metrics; class 1 is the positive class.
    /// An empty holdout leaves every score `None`.
    pub fn compute_classification(y_true: &[usize], y_pred: &[usize], y_prob: Option<&[f64]>) -> Self {
        let mut metrics = Self::new();
        metrics.n_holdout = y_true.len();
        if y_true.is_empty() {
            return metrics;
        }

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        metrics.accuracy = Some(correct as f64 / y_true.len() as f64);

        let (tp, fp, _tn, fn_) = confusion_counts(y_true, y_pred);
        let precision = if tp + fp > 0 { tp as f64 / (tp + fp) as f64 } else { 0.0 };
        let recall = if tp + fn_ > 0 { tp as f64 / (tp + fn_) as f64 } else { 0.0 };
        metrics.precision = Some(precision);
        metrics.recall = Some(recall);
        metrics.f1_score = Some(if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        });

        metrics.auc_roc = y_prob.and_then(|p| roc_auc(y_true, p));
        metrics
    }
}

fn confusion_counts(y_true: &[usize], y_pred: &[usize]) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t == 1, p == 1) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }
    (tp, fp, tn, fn_)
}

/// Area under the ROC curve via the rank-sum statistic, with tied scores
/// sharing their average rank
pub fn roc_auc(y_true: &[usize], scores: &[f64]) -> Option<f64> {
    if y_true.len() != scores.len() {
        return None;
    }
    let n_pos = y_true.iter().filter(|&&t| t == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based
        let avg = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&t, _)| t == 1)
        .map(|(_, &r)| r)
        .sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_metrics() {
        let y_true = [1, 0, 1, 1, 0, 1, 0, 0];
        let y_pred = [1, 0, 1, 0, 0, 1, 1, 0];

        let metrics = ModelMetrics::compute_classification(&y_true, &y_pred, None);
        assert_eq!(metrics.accuracy, Some(0.75));
        assert_eq!(metrics.precision, Some(0.75));
        assert_eq!(metrics.recall, Some(0.75));
        assert_eq!(metrics.f1_score, Some(0.75));
        assert_eq!(metrics.auc_roc, None);
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        let y = [0, 0, 1, 1];
        assert_eq!(roc_auc(&y, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&y, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
    }

    #[test]
    fn test_auc_ties() {
        let y = [0, 1];
        assert_eq!(roc_auc(&y, &[0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[1, 1], &[0.1, 0.2]), None);
    }

    #[test]
    fn test_empty_holdout() {
        let metrics = ModelMetrics::compute_classification(&[], &[], None);
        assert_eq!(metrics.accuracy, None);
        assert_eq!(metrics.n_holdout, 0);
    }
}
