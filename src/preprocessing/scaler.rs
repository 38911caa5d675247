//! Feature scaling

use super::imputer::numeric_values;
use crate::error::{Result, WorkforceError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerType {
    /// z-score: (x - mean) / std
    Standard,
    /// (x - min) / (max - min)
    MinMax,
    /// Pass values through unchanged
    None,
}

/// Fitted parameters for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// mean or min
    pub center: f64,
    /// std or range, never zero
    pub scale: f64,
}

/// Per-column numeric scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Fit on the given columns. Nulls are ignored; columns absent from
    /// `df` are skipped.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for name in columns {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let values: Vec<f64> = numeric_values(column.as_materialized_series())?
                .into_iter()
                .flatten()
                .collect();
            self.params.insert(name.clone(), self.compute_params(&values));
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale every fitted column present in `df`, producing Float64 columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| (v - p.center) / p.scale)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| v * p.scale + p.center)
    }

    pub fn params(&self, column: &str) -> Option<&ScalerParams> {
        self.params.get(column)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn apply(&self, df: &DataFrame, f: impl Fn(f64, &ScalerParams) -> f64) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(WorkforceError::ModelNotFitted);
        }

        // Build all replacement columns first, then apply them in one pass
        let replacements: Vec<Series> = self
            .params
            .iter()
            .filter_map(|(name, params)| {
                df.column(name).ok().map(|column| {
                    let series = column.as_materialized_series();
                    let ca: Float64Chunked = numeric_values(series)?
                        .into_iter()
                        .map(|opt| opt.map(|v| f(v, params)))
                        .collect();
                    Ok(ca.with_name(series.name().clone()).into_series())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    fn compute_params(&self, values: &[f64]) -> ScalerParams {
        let non_zero = |s: f64| if s == 0.0 || !s.is_finite() { 1.0 } else { s };
        match self.scaler_type {
            ScalerType::Standard => {
                let n = values.len();
                if n == 0 {
                    return ScalerParams { center: 0.0, scale: 1.0 };
                }
                let mean = values.iter().sum::<f64>() / n as f64;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
                ScalerParams {
                    center: mean,
                    scale: non_zero(var.sqrt()),
                }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if values.is_empty() {
                    return ScalerParams { center: 0.0, scale: 1.0 };
                }
                ScalerParams {
                    center: min,
                    scale: non_zero(max - min),
                }
            }
            ScalerType::None => ScalerParams { center: 0.0, scale: 1.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![Column::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap()
    }

    fn cols() -> Vec<String> {
        vec!["a".to_string()]
    }

    #[test]
    fn test_standard_scaler() {
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&frame(), &cols()).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        let mean: f64 = col.mean().unwrap();
        assert!(mean.abs() < 1e-10);
        assert!((scaler.params("a").unwrap().scale - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_minmax_scaler() {
        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&frame(), &cols()).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let df = df!("a" => &[3i64, 3, 3]).unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &cols()).unwrap();
        let values: Vec<f64> = result.column("a").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inverse_transform() {
        let df = frame();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let scaled = scaler.fit_transform(&df, &cols()).unwrap();
        let unscaled = scaler.inverse_transform(&scaled).unwrap();

        let original = df.column("a").unwrap().f64().unwrap();
        let restored = unscaled.column("a").unwrap().f64().unwrap();
        for (o, r) in original.into_iter().zip(restored.into_iter()) {
            assert!((o.unwrap() - r.unwrap()).abs() < 1e-10);
        }
    }
}
