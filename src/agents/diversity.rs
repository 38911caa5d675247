//! Diversity KPIs

use super::frame::{flags, floats, median, strings};
use super::Agent;
use crate::error::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names and marker values the diversity KPIs read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityColumns {
    pub gender: String,
    pub ethnicity: String,
    pub is_leader: String,
    pub status: String,
    pub salary: String,
    pub female: String,
    pub male: String,
    /// `status` value of employees who have left
    pub left: String,
}

impl Default for DiversityColumns {
    fn default() -> Self {
        Self {
            gender: "gender".to_string(),
            ethnicity: "ethnicity".to_string(),
            is_leader: "is_leader".to_string(),
            status: "status".to_string(),
            salary: "salary".to_string(),
            female: "Female".to_string(),
            male: "Male".to_string(),
            left: "Left".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityReport {
    /// Share of employees recorded as female
    pub gender_ratio: Option<f64>,
    pub ethnicity_distribution: BTreeMap<String, f64>,
    /// Share of leaders recorded as female
    pub female_leadership_ratio: Option<f64>,
    /// Gender mix among employees who left
    pub turnover_by_gender: BTreeMap<String, f64>,
    pub median_salary_by_gender: BTreeMap<String, f64>,
    /// Female median salary over male median salary
    pub pay_equity_ratio: Option<f64>,
}

/// Compute diversity KPIs over an employee table.
///
/// Missing columns leave their KPIs empty; ratios with a zero denominator
/// are `None`.
pub fn monitor_diversity(df: &DataFrame, columns: &DiversityColumns) -> Result<DiversityReport> {
    let total = df.height();
    let gender = strings(df, &columns.gender)?;
    let is_female = |g: &Option<String>| g.as_deref() == Some(columns.female.as_str());

    let gender_ratio = match &gender {
        Some(values) if total > 0 => Some(values.iter().filter(|g| is_female(g)).count() as f64 / total as f64),
        _ => None,
    };

    let ethnicity_distribution = strings(df, &columns.ethnicity)?
        .map(|values| shares(values.iter().flatten()))
        .unwrap_or_default();

    let leaders = flags(df, &columns.is_leader)?;
    let female_leadership_ratio = match (&gender, &leaders) {
        (Some(gender), Some(leaders)) => {
            let n_leaders = leaders.iter().filter(|&&l| l).count();
            let female_leaders = gender
                .iter()
                .zip(leaders)
                .filter(|(g, &l)| l && is_female(g))
                .count();
            (n_leaders > 0).then(|| female_leaders as f64 / n_leaders as f64)
        }
        _ => None,
    };

    let turnover_by_gender = match (&gender, strings(df, &columns.status)?) {
        (Some(gender), Some(status)) => shares(
            gender
                .iter()
                .zip(&status)
                .filter(|(_, s)| s.as_deref() == Some(columns.left.as_str()))
                .filter_map(|(g, _)| g.as_ref()),
        ),
        _ => BTreeMap::new(),
    };

    let median_salary_by_gender = match (&gender, floats(df, &columns.salary)?) {
        (Some(gender), Some(salary)) => {
            let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for (g, s) in gender.iter().zip(&salary) {
                if let (Some(g), Some(s)) = (g, s) {
                    groups.entry(g.clone()).or_default().push(*s);
                }
            }
            groups
                .into_iter()
                .filter_map(|(g, mut values)| median(&mut values).map(|m| (g, m)))
                .collect()
        }
        _ => BTreeMap::new(),
    };

    let pay_equity_ratio = match (
        median_salary_by_gender.get(&columns.female),
        median_salary_by_gender.get(&columns.male),
    ) {
        (Some(f), Some(m)) if *m != 0.0 => Some(f / m),
        _ => None,
    };

    Ok(DiversityReport {
        gender_ratio,
        ethnicity_distribution,
        female_leadership_ratio,
        turnover_by_gender,
        median_salary_by_gender,
        pay_equity_ratio,
    })
}

/// Normalised value counts
fn shares<'a>(values: impl Iterator<Item = &'a String>) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.clone()).or_default() += 1;
    }
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(k, n)| (k, n as f64 / total as f64))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DiversityAgent {
    columns: DiversityColumns,
}

impl DiversityAgent {
    pub fn new(columns: DiversityColumns) -> Self {
        Self { columns }
    }
}

impl Agent for DiversityAgent {
    type Request = DataFrame;
    type Report = DiversityReport;

    fn name(&self) -> &'static str {
        "diversity"
    }

    fn description(&self) -> &'static str {
        "Gender, ethnicity, leadership, turnover and pay equity KPIs"
    }

    fn run(&self, df: &DataFrame) -> Result<DiversityReport> {
        monitor_diversity(df, &self.columns)
    }
}
