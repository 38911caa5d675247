//! Workforce analytics
//!
//! Agent modules over HR tables: attrition risk prediction with a random
//! forest, diversity KPIs, skill-gap detection, headcount planning, retention
//! intervention simulation and task productivity. Each agent is reachable
//! from the library, the `workforce` CLI and the REST server.
//!
//! # Modules
//!
//! ## Data
//! - [`schema`] - HR table contract and validation
//! - [`preprocessing`] - Date conversion, imputation, encoding, scaling
//! - [`utils`] - CSV loading and JSON table conversion
//! - [`synthetic`] - Synthetic HR data generation
//!
//! ## Modelling
//! - [`training`] - Decision trees, random forest, metrics
//! - [`attrition`] - Attrition model, persistence, reports
//!
//! ## Agents and services
//! - [`agents`] - The six analysis agents
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

pub mod error;
pub mod config;

pub mod schema;
pub mod preprocessing;
pub mod utils;
pub mod synthetic;

pub mod training;
pub mod attrition;

pub mod agents;
pub mod server;
pub mod cli;

pub use error::{Result, WorkforceError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, WorkforceError};
    pub use crate::config::AppConfig;

    pub use crate::schema::{hr_schema, DataSchema, ValidationReport};
    pub use crate::preprocessing::{Preprocessor, PreprocessingConfig};
    pub use crate::utils::DataLoader;
    pub use crate::synthetic::HrDataGenerator;

    pub use crate::training::{ModelMetrics, RandomForest};
    pub use crate::attrition::{AttritionModel, AttritionReport, SharedAttritionModel};

    pub use crate::agents::{
        analyze_productivity, analyze_skill_gap, forecast_workforce_plan, monitor_diversity,
        simulate_attrition_interventions, Agent, AttritionAgent, DiversityAgent, PlanningAgent,
        ProductivityAgent, ResultStore, SimulationAgent, SkillGapAgent,
    };
}
