//! Analysis agents
//!
//! Each agent takes a request made of one or more tables plus parameters and
//! returns a serialisable report. Only the attrition agent holds state (its
//! trained model); the others are pure aggregations over their input.

mod attrition;
mod diversity;
pub(crate) mod frame;
mod planning;
mod productivity;
mod results;
mod simulation;
mod skill_gap;

pub use attrition::AttritionAgent;
pub use diversity::{monitor_diversity, DiversityAgent, DiversityColumns, DiversityReport};
pub use planning::{forecast_workforce_plan, PlanningAgent, PlanningConfig, PlanningReport, PlanningRequest, RoleForecast};
pub use productivity::{
    analyze_productivity, AgingBucket, Bottleneck, ProductivityAgent, ProductivityConfig, ProductivityReport,
    ProductivityRequest,
};
pub use results::ResultStore;
pub use simulation::{
    intervention_catalog, simulate_attrition_interventions, ImpactRange, Intervention, SimulationAgent,
    SimulationConfig, SimulationReport, SimulationRequest,
};
pub use skill_gap::{
    analyze_skill_gap, default_role_skills, EmployeeSkillGap, SkillGapAgent, SkillGapReport, SkillGapRequest,
    SkillsConfig,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A unit of analysis exposed through the CLI and the REST API
pub trait Agent: Send + Sync {
    type Request;
    type Report: Serialize;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn run(&self, request: &Self::Request) -> Result<Self::Report>;

    /// Run and keep the report in `store` under the agent's name
    fn run_and_save(&self, request: &Self::Request, store: &ResultStore) -> Result<Self::Report> {
        let report = self.run(request)?;
        store.save(self.name(), &report)?;
        Ok(report)
    }
}

/// Public description of a registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub endpoint: String,
}

/// Index of the agents a front end exposes
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    entries: Vec<AgentInfo>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `agent` as served at `endpoint`; a repeated name replaces the entry
    pub fn register<A: Agent>(&mut self, agent: &A, endpoint: impl Into<String>) -> &mut Self {
        let info = AgentInfo {
            name: agent.name().to_string(),
            description: agent.description().to_string(),
            endpoint: endpoint.into(),
        };
        match self.entries.iter_mut().find(|e| e.name == info.name) {
            Some(existing) => *existing = info,
            None => self.entries.push(info),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&AgentInfo> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[AgentInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let mut registry = AgentRegistry::new();
        assert!(registry.is_empty());
        registry
            .register(&DiversityAgent::default(), "/api/diversity/analyze")
            .register(&PlanningAgent::default(), "/api/planning/forecast")
            .register(&DiversityAgent::default(), "/api/v2/diversity");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("diversity").unwrap().endpoint, "/api/v2/diversity");
        assert!(registry.get("unknown").is_none());
    }
}
