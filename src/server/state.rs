//! Application state management

use crate::agents::{
    AgentRegistry, AttritionAgent, DiversityAgent, PlanningAgent, ProductivityAgent, ResultStore, SimulationAgent,
    SkillGapAgent,
};
use crate::config::AppConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Application state shared across handlers
pub struct AppState {
    pub config: AppConfig,
    pub registry: AgentRegistry,
    pub attrition: AttritionAgent,
    pub diversity: DiversityAgent,
    pub skill_gap: SkillGapAgent,
    pub planning: PlanningAgent,
    pub simulation: SimulationAgent,
    pub productivity: ProductivityAgent,
    pub results: ResultStore,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build every agent from `config`, loading a stored attrition model if one exists
    pub fn new(config: AppConfig) -> Result<Self> {
        let attrition = AttritionAgent::from_config(&config)?;
        let diversity = DiversityAgent::new(config.diversity.clone());
        let skill_gap = SkillGapAgent::new(config.skills.clone());
        let planning = PlanningAgent::new(config.planning.clone());
        let simulation = SimulationAgent::new(config.simulation.clone());
        let productivity = ProductivityAgent::new(config.productivity.clone());

        let mut registry = AgentRegistry::new();
        registry
            .register(&attrition, "/api/attrition/analyze")
            .register(&diversity, "/api/diversity/analyze")
            .register(&skill_gap, "/api/skill-gap/analyze")
            .register(&planning, "/api/planning/forecast")
            .register(&simulation, "/api/simulation/attrition")
            .register(&productivity, "/api/productivity/analyze");

        Ok(Self {
            results: ResultStore::new(&config.paths.results_dir),
            config,
            registry,
            attrition,
            diversity,
            skill_gap,
            planning,
            simulation,
            productivity,
            started_at: Utc::now(),
        })
    }
}
