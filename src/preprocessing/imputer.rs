//! Missing value imputation

use crate::error::{Result, WorkforceError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How missing numeric values are filled. String columns always use the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    Median,
    Zero,
}

/// Fill value learned for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Numeric(f64),
    Text(String),
}

/// Used when a string column has no values at all
const UNKNOWN_CATEGORY: &str = "Unknown";

/// Per-column missing value imputer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, FillValue>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Learn fill values. Columns absent from `df` are skipped.
    pub fn fit(&mut self, df: &DataFrame, numeric: &[String], categorical: &[String]) -> Result<&mut Self> {
        for name in numeric {
            if let Ok(column) = df.column(name) {
                let values = numeric_values(column.as_materialized_series())?;
                let fill = match self.strategy {
                    ImputeStrategy::Mean => mean(&values),
                    ImputeStrategy::Median => median(&values),
                    ImputeStrategy::Zero => 0.0,
                };
                self.fill_values.insert(name.clone(), FillValue::Numeric(fill));
            }
        }
        for name in categorical {
            if let Ok(column) = df.column(name) {
                let fill = mode(column.as_materialized_series())?
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
                self.fill_values.insert(name.clone(), FillValue::Text(fill));
            }
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls (and NaN) with the learned values.
    /// Numeric columns come out as Float64, categorical columns as String.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(WorkforceError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (name, fill) in &self.fill_values {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();
            let filled = match fill {
                FillValue::Numeric(value) => {
                    let ca: Float64Chunked = numeric_values(series)?
                        .into_iter()
                        .map(|v| Some(v.unwrap_or(*value)))
                        .collect();
                    ca.with_name(series.name().clone()).into_series()
                }
                FillValue::Text(value) => {
                    let as_str = series.cast(&DataType::String)?;
                    let ca: StringChunked = as_str
                        .str()?
                        .into_iter()
                        .map(|v| Some(v.unwrap_or(value.as_str())))
                        .collect();
                    ca.with_name(series.name().clone()).into_series()
                }
            };
            result.with_column(filled)?;
        }
        Ok(result)
    }

    pub fn fill_value(&self, column: &str) -> Option<&FillValue> {
        self.fill_values.get(column)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

/// Column as f64 with NaN folded into None
pub(crate) fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let as_f64 = series.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn mean(values: &[Option<f64>]) -> f64 {
    let (sum, n) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn median(values: &[Option<f64>]) -> f64 {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return 0.0;
    }
    present.sort_by(|a, b| a.total_cmp(b));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) / 2.0
    } else {
        present[mid]
    }
}

/// Most frequent value; ties go to the lexicographically smallest
fn mode(series: &Series) -> Result<Option<String>> {
    let as_str = series.cast(&DataType::String)?;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in as_str.str()?.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let best = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (&value, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((value, count)),
        });
    Ok(best.map(|(value, _)| value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "x" => &[Some(1.0), None, Some(5.0), Some(3.0)],
            "team" => &[Some("b"), Some("a"), None, Some("b")],
        )
        .unwrap()
    }

    #[test]
    fn test_mean_and_mode_fill() {
        let df = sample();
        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        imputer
            .fit(&df, &["x".to_string()], &["team".to_string()])
            .unwrap();
        let out = imputer.transform(&df).unwrap();

        let x: Vec<f64> = out.column("x").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_eq!(x, vec![1.0, 3.0, 5.0, 3.0]);

        let team = out.column("team").unwrap().str().unwrap();
        assert_eq!(team.get(2), Some("b"));
        assert_eq!(team.null_count(), 0);
    }

    #[test]
    fn test_median_and_zero() {
        let df = df!("x" => &[Some(1.0), Some(2.0), Some(10.0), None]).unwrap();
        let cols = ["x".to_string()];

        let mut median = Imputer::new(ImputeStrategy::Median);
        median.fit(&df, &cols, &[]).unwrap();
        assert_eq!(median.fill_value("x"), Some(&FillValue::Numeric(2.0)));

        let mut zero = Imputer::new(ImputeStrategy::Zero);
        zero.fit(&df, &cols, &[]).unwrap();
        let out = zero.transform(&df).unwrap();
        assert_eq!(out.column("x").unwrap().f64().unwrap().get(3), Some(0.0));
    }

    #[test]
    fn test_mode_tie_breaks_lexicographically() {
        let df = df!("c" => &["z", "a", "z", "a"]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        imputer.fit(&df, &[], &["c".to_string()]).unwrap();
        assert_eq!(imputer.fill_value("c"), Some(&FillValue::Text("a".to_string())));
    }

    #[test]
    fn test_transform_before_fit() {
        let imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(matches!(
            imputer.transform(&sample()),
            Err(WorkforceError::ModelNotFitted)
        ));
    }
}
