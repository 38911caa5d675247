//! Categorical encoding

use crate::error::{Result, WorkforceError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Categorical encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderType {
    /// One 0/1 column per category, named `<column>_<category>`
    OneHot,
    /// A single column holding the category's sorted position
    Ordinal,
}

/// Categories seen for one column at fit time, sorted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnCategories {
    column: String,
    categories: Vec<String>,
}

/// Categorical encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    columns: Vec<ColumnCategories>,
    is_fitted: bool,
}

impl Encoder {
    pub fn new(encoder_type: EncoderType) -> Self {
        Self {
            encoder_type,
            columns: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the category set of each column. A column absent from `df`
    /// gets an empty category set.
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.columns = columns
            .iter()
            .map(|name| {
                let categories = match df.column(name) {
                    Ok(column) => {
                        let as_str = column.as_materialized_series().cast(&DataType::String)?;
                        let unique: BTreeSet<String> = as_str
                            .str()?
                            .into_iter()
                            .flatten()
                            .map(str::to_string)
                            .collect();
                        unique.into_iter().collect()
                    }
                    Err(_) => Vec::new(),
                };
                Ok(ColumnCategories {
                    column: name.clone(),
                    categories,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(self)
    }

    /// Output column names, in output order
    pub fn feature_names(&self) -> Vec<String> {
        match self.encoder_type {
            EncoderType::OneHot => self
                .columns
                .iter()
                .flat_map(|c| {
                    c.categories
                        .iter()
                        .map(move |cat| format!("{}_{}", c.column, cat))
                })
                .collect(),
            EncoderType::Ordinal => self.columns.iter().map(|c| c.column.clone()).collect(),
        }
    }

    /// Encode every fitted column into Float64 columns.
    ///
    /// Unseen categories (and nulls) encode to all zeros for one-hot and
    /// to `-1` for ordinal. A fitted column missing from `df` encodes as if
    /// every row held an unseen category.
    pub fn encode(&self, df: &DataFrame) -> Result<Vec<Column>> {
        if !self.is_fitted {
            return Err(WorkforceError::ModelNotFitted);
        }
        let height = df.height();
        let mut out = Vec::new();

        for fitted in &self.columns {
            let positions: Vec<Option<usize>> = match df.column(&fitted.column) {
                Ok(column) => {
                    let as_str = column.as_materialized_series().cast(&DataType::String)?;
                    as_str
                        .str()?
                        .into_iter()
                        .map(|v| v.and_then(|s| fitted.categories.binary_search_by(|c| c.as_str().cmp(s)).ok()))
                        .collect()
                }
                Err(_) => vec![None; height],
            };

            match self.encoder_type {
                EncoderType::OneHot => {
                    for (k, category) in fitted.categories.iter().enumerate() {
                        let values: Vec<f64> = positions
                            .iter()
                            .map(|p| if *p == Some(k) { 1.0 } else { 0.0 })
                            .collect();
                        let name = format!("{}_{}", fitted.column, category);
                        out.push(Column::new(name.into(), values));
                    }
                }
                EncoderType::Ordinal => {
                    let values: Vec<f64> = positions
                        .iter()
                        .map(|p| p.map_or(-1.0, |k| k as f64))
                        .collect();
                    out.push(Column::new(fitted.column.as_str().into(), values));
                }
            }
        }
        Ok(out)
    }

    /// Categories learned for a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.categories.as_slice())
    }

    pub fn encoder_type(&self) -> EncoderType {
        self.encoder_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(kind: EncoderType) -> Encoder {
        let df = df!("dept" => &["Sales", "IT", "Sales", "HR"]).unwrap();
        let mut encoder = Encoder::new(kind);
        encoder.fit(&df, &["dept".to_string()]).unwrap();
        encoder
    }

    #[test]
    fn test_one_hot_layout_is_sorted() {
        let encoder = fitted(EncoderType::OneHot);
        assert_eq!(
            encoder.feature_names(),
            vec!["dept_HR", "dept_IT", "dept_Sales"]
        );
    }

    #[test]
    fn test_one_hot_unseen_is_zero() {
        let encoder = fitted(EncoderType::OneHot);
        let df = df!("dept" => &["IT", "Legal"]).unwrap();
        let cols = encoder.encode(&df).unwrap();
        assert_eq!(cols.len(), 3);
        let it: Vec<f64> = cols[1].f64().unwrap().into_no_null_iter().collect();
        assert_eq!(it, vec![1.0, 0.0]);
        let row_sum: f64 = cols.iter().map(|c| c.f64().unwrap().get(1).unwrap()).sum();
        assert_eq!(row_sum, 0.0);
    }

    #[test]
    fn test_ordinal_unseen_is_minus_one() {
        let encoder = fitted(EncoderType::Ordinal);
        let df = df!("dept" => &["Sales", "Legal", "HR"]).unwrap();
        let cols = encoder.encode(&df).unwrap();
        let values: Vec<f64> = cols[0].f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![2.0, -1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_encodes_as_unseen() {
        let encoder = fitted(EncoderType::OneHot);
        let df = df!("other" => &[1i32, 2]).unwrap();
        let cols = encoder.encode(&df).unwrap();
        assert!(cols
            .iter()
            .all(|c| c.f64().unwrap().into_no_null_iter().all(|v| v == 0.0)));
    }
}
