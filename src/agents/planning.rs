//! Headcount and hiring budget forecast

use super::frame::{floats, require_columns, round_to, strings};
use super::Agent;
use crate::error::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Cost on top of salary per hire, as a fraction of salary
    pub overhead_rate: f64,
    /// Conversion rate for roles absent from the pipeline
    pub default_conversion_rate: f64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            overhead_rate: 0.3,
            default_conversion_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanningRequest {
    /// `role`, `planned_hires`, `avg_salary`
    pub headcount_plan: DataFrame,
    /// `role`, `conversion_rate`
    pub hiring_pipeline: DataFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleForecast {
    pub role: String,
    pub expected_hires: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningReport {
    /// Whole hires expected next quarter, rounded down
    pub next_quarter_hires: u64,
    pub budget_impact: f64,
    pub by_role: Vec<RoleForecast>,
}

/// Expected hires and their cost per planned role.
///
/// A role's conversion rate is the mean of its pipeline rates. Null planned
/// hires or salaries count as zero.
pub fn forecast_workforce_plan(
    headcount_plan: &DataFrame,
    hiring_pipeline: &DataFrame,
    config: &PlanningConfig,
) -> Result<PlanningReport> {
    if headcount_plan.height() == 0 {
        return Ok(PlanningReport::default());
    }
    require_columns(headcount_plan, &["role", "planned_hires", "avg_salary"])?;

    let conversion = mean_conversion_by_role(hiring_pipeline)?;
    let roles = strings(headcount_plan, "role")?.unwrap_or_default();
    let planned = floats(headcount_plan, "planned_hires")?.unwrap_or_default();
    let salaries = floats(headcount_plan, "avg_salary")?.unwrap_or_default();

    let by_role: Vec<RoleForecast> = roles
        .into_iter()
        .zip(planned)
        .zip(salaries)
        .map(|((role, planned), salary)| {
            let role = role.unwrap_or_default();
            let rate = conversion
                .get(&role)
                .copied()
                .unwrap_or(config.default_conversion_rate);
            let expected_hires = planned.unwrap_or(0.0) * rate;
            let cost_per_hire = salary.unwrap_or(0.0) * (1.0 + config.overhead_rate);
            RoleForecast {
                role,
                expected_hires,
                total_cost: expected_hires * cost_per_hire,
            }
        })
        .collect();

    let hires: f64 = by_role.iter().map(|r| r.expected_hires).sum();
    let cost: f64 = by_role.iter().map(|r| r.total_cost).sum();
    Ok(PlanningReport {
        next_quarter_hires: hires.max(0.0).floor() as u64,
        budget_impact: round_to(cost, 2),
        by_role,
    })
}

fn mean_conversion_by_role(pipeline: &DataFrame) -> Result<HashMap<String, f64>> {
    let (Some(roles), Some(rates)) = (strings(pipeline, "role")?, floats(pipeline, "conversion_rate")?) else {
        return Ok(HashMap::new());
    };
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for (role, rate) in roles.into_iter().zip(rates) {
        if let (Some(role), Some(rate)) = (role, rate) {
            let entry = sums.entry(role).or_insert((0.0, 0));
            entry.0 += rate;
            entry.1 += 1;
        }
    }
    Ok(sums
        .into_iter()
        .map(|(role, (sum, n))| (role, sum / n as f64))
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct PlanningAgent {
    config: PlanningConfig,
}

impl PlanningAgent {
    pub fn new(config: PlanningConfig) -> Self {
        Self { config }
    }
}

impl Agent for PlanningAgent {
    type Request = PlanningRequest;
    type Report = PlanningReport;

    fn name(&self) -> &'static str {
        "planning"
    }

    fn description(&self) -> &'static str {
        "Next-quarter hires and budget impact from a headcount plan"
    }

    fn run(&self, request: &PlanningRequest) -> Result<PlanningReport> {
        forecast_workforce_plan(&request.headcount_plan, &request.hiring_pipeline, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn plan() -> DataFrame {
        df!(
            "role" => &["Developer", "Recruiter", "Accountant"],
            "planned_hires" => &[10i64, 4, 3],
            "avg_salary" => &[100_000.0, 50_000.0, 60_000.0],
        )
        .unwrap()
    }

    fn pipeline() -> DataFrame {
        df!(
            "role" => &["Developer", "Developer", "Recruiter"],
            "conversion_rate" => &[0.4, 0.6, 0.25],
        )
        .unwrap()
    }

    #[test]
    fn test_forecast() {
        let report = forecast_workforce_plan(&plan(), &pipeline(), &PlanningConfig::default()).unwrap();
        // 10 * 0.5 + 4 * 0.25 + 3 * 1.0
        assert_eq!(report.next_quarter_hires, 9);
        let dev = &report.by_role[0];
        assert!((dev.expected_hires - 5.0).abs() < 1e-12);
        assert!((dev.total_cost - 650_000.0).abs() < 1e-6);
        // 650000 + 65000 + 234000
        assert_eq!(report.budget_impact, 949_000.0);
    }

    #[test]
    fn test_fractional_hires_round_down() {
        let plan = df!("role" => &["A"], "planned_hires" => &[3i64], "avg_salary" => &[10.0]).unwrap();
        let pipeline = df!("role" => &["A"], "conversion_rate" => &[0.5]).unwrap();
        let report = forecast_workforce_plan(&plan, &pipeline, &PlanningConfig::default()).unwrap();
        assert_eq!(report.next_quarter_hires, 1);
        assert_eq!(report.budget_impact, 19.5);
    }

    #[test]
    fn test_zero_planned_hires() {
        let plan = df!(
            "role" => &["Developer", "Recruiter"],
            "planned_hires" => &[0i64, 0],
            "avg_salary" => &[100_000.0, 50_000.0],
        )
        .unwrap();
        let report = forecast_workforce_plan(&plan, &pipeline(), &PlanningConfig::default()).unwrap();
        assert_eq!(report.next_quarter_hires, 0);
        assert_eq!(report.budget_impact, 0.0);
    }

    #[test]
    fn test_empty_tables() {
        let empty = DataFrame::empty();
        let report = PlanningAgent::default()
            .run(&PlanningRequest {
                headcount_plan: empty.clone(),
                hiring_pipeline: empty,
            })
            .unwrap();
        assert_eq!(report, PlanningReport::default());

        let report = forecast_workforce_plan(&plan(), &DataFrame::empty(), &PlanningConfig::default()).unwrap();
        assert_eq!(report.next_quarter_hires, 17);
    }

    #[test]
    fn test_plan_missing_columns() {
        let plan = df!("role" => &["A"]).unwrap();
        let err = forecast_workforce_plan(&plan, &pipeline(), &PlanningConfig::default()).unwrap_err();
        assert!(err.to_string().contains("planned_hires"));
    }
}
