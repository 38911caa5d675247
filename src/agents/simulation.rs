//! Retention what-if simulation

use super::frame::round_to;
use super::Agent;
use crate::attrition::encode_labels;
use crate::error::{Result, WorkforceError};
use polars::prelude::DataFrame;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed of the participant draw
    pub seed: u64,
    /// 0/1 or yes/no column marking employees who would leave
    pub attrited_column: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            attrited_column: "attrited".to_string(),
        }
    }
}

/// A retention programme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    #[serde(rename = "type")]
    pub kind: String,
    /// Percentage of participating leavers the programme keeps
    #[serde(default)]
    pub effect_size_pct: f64,
    #[serde(default)]
    pub cost_per_employee: f64,
}

impl Intervention {
    /// A catalog intervention at its typical impact
    pub fn typical(kind: &str, cost_per_employee: f64) -> Option<Self> {
        intervention_catalog().get(kind).map(|range| Self {
            kind: kind.to_string(),
            effect_size_pct: range.typical_impact * 100.0,
            cost_per_employee,
        })
    }
}

/// Expected impact of an intervention, as a fraction of leavers retained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRange {
    pub min_impact: f64,
    pub max_impact: f64,
    pub typical_impact: f64,
}

/// Stock interventions and their usual impact
pub fn intervention_catalog() -> BTreeMap<String, ImpactRange> {
    [
        ("Career Development Program", 0.1, 0.3, 0.2),
        ("Flexible Work Arrangements", 0.05, 0.15, 0.1),
        ("Compensation Adjustment", 0.15, 0.25, 0.2),
        ("Mentorship Program", 0.08, 0.18, 0.13),
    ]
    .into_iter()
    .map(|(name, min_impact, max_impact, typical_impact)| {
        (
            name.to_string(),
            ImpactRange {
                min_impact,
                max_impact,
                typical_impact,
            },
        )
    })
    .collect()
}

#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub employees: DataFrame,
    pub intervention: Intervention,
    /// Fraction of the workforce enrolled, in [0, 1]
    pub participation_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub baseline_attrition_rate: f64,
    pub projected_attrition_rate: f64,
    pub baseline_retention_rate: f64,
    pub projected_retention_rate: f64,
    pub employees_participating: usize,
    pub attritions_rescued: usize,
    pub intervention_cost: f64,
    pub intervention_type: String,
}

/// Project attrition after enrolling a random share of employees.
///
/// Participants are drawn without replacement from a seeded generator, and
/// the intervention keeps `effect_size_pct` percent of the participants who
/// would otherwise leave (rounded down).
pub fn simulate_attrition_interventions(
    employees: &DataFrame,
    intervention: &Intervention,
    participation_rate: f64,
    config: &SimulationConfig,
) -> Result<SimulationReport> {
    if !(0.0..=1.0).contains(&participation_rate) {
        return Err(invalid("participation_rate", participation_rate, "must be between 0 and 1"));
    }
    if !(0.0..=100.0).contains(&intervention.effect_size_pct) {
        return Err(invalid(
            "effect_size_pct",
            intervention.effect_size_pct,
            "must be between 0 and 100",
        ));
    }
    if !(intervention.cost_per_employee >= 0.0) {
        return Err(invalid(
            "cost_per_employee",
            intervention.cost_per_employee,
            "must not be negative",
        ));
    }

    let total = employees.height();
    if total == 0 {
        return Ok(SimulationReport {
            intervention_type: intervention.kind.clone(),
            ..Default::default()
        });
    }

    let attrited = encode_labels(employees, &config.attrited_column)?;
    let baseline: usize = attrited.iter().sum();

    let n_participants = ((total as f64 * participation_rate).floor() as usize).min(total);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let participating_leavers = sample(&mut rng, total, n_participants)
        .into_iter()
        .filter(|&i| attrited[i] == 1)
        .count();
    let rescued = (participating_leavers as f64 * intervention.effect_size_pct / 100.0).floor() as usize;
    let projected = baseline - rescued.min(baseline);

    let baseline_rate = baseline as f64 / total as f64;
    let projected_rate = projected as f64 / total as f64;
    debug!(
        total,
        participants = n_participants,
        rescued,
        intervention = %intervention.kind,
        "Simulated intervention"
    );

    Ok(SimulationReport {
        baseline_attrition_rate: round_to(baseline_rate, 3),
        projected_attrition_rate: round_to(projected_rate, 3),
        baseline_retention_rate: round_to(1.0 - baseline_rate, 3),
        projected_retention_rate: round_to(1.0 - projected_rate, 3),
        employees_participating: n_participants,
        attritions_rescued: rescued,
        intervention_cost: round_to(n_participants as f64 * intervention.cost_per_employee, 2),
        intervention_type: intervention.kind.clone(),
    })
}

fn invalid(name: &str, value: f64, reason: &str) -> WorkforceError {
    WorkforceError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationAgent {
    config: SimulationConfig,
}

impl SimulationAgent {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl Agent for SimulationAgent {
    type Request = SimulationRequest;
    type Report = SimulationReport;

    fn name(&self) -> &'static str {
        "simulation"
    }

    fn description(&self) -> &'static str {
        "Projected attrition and cost of a retention intervention"
    }

    fn run(&self, request: &SimulationRequest) -> Result<SimulationReport> {
        simulate_attrition_interventions(
            &request.employees,
            &request.intervention,
            request.participation_rate,
            &self.config,
        )
    }
}
