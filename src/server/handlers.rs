//! HTTP request handlers

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::agents::{
    intervention_catalog, Agent, DiversityReport, ImpactRange, Intervention, PlanningReport, PlanningRequest,
    ProductivityReport, ProductivityRequest, SimulationReport, SimulationRequest, SkillGapReport, SkillGapRequest,
};
use crate::attrition::{AttritionReport, FeatureImportance};
use crate::training::ModelMetrics;
use crate::utils::frame_from_columns;

use super::error::{Result, ServerError};
use super::state::AppState;

type Table = Map<String, Value>;

/// Run CPU-bound agent work off the async runtime
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

// ============================================================================
// Attrition
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TableRequest {
    pub data: Table,
}

pub async fn analyze_attrition(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TableRequest>,
) -> Result<Json<AttritionReport>> {
    let df = frame_from_columns(&request.data)?;
    info!(rows = df.height(), "Attrition analysis requested");
    let report = blocking(move || state.attrition.run_and_save(&df, &state.results)).await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub success: bool,
    pub metrics: ModelMetrics,
}

pub async fn train_attrition(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TableRequest>,
) -> Result<Json<TrainResponse>> {
    let df = frame_from_columns(&request.data)?;
    let metrics = blocking(move || state.attrition.train(&df)).await?;
    Ok(Json(TrainResponse { success: true, metrics }))
}

pub async fn feature_importance(State(state): State<Arc<AppState>>) -> Result<Json<Vec<FeatureImportance>>> {
    Ok(Json(state.attrition.feature_importance()?))
}

// ============================================================================
// Diversity
// ============================================================================

pub async fn analyze_diversity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TableRequest>,
) -> Result<Json<DiversityReport>> {
    let df = frame_from_columns(&request.data)?;
    Ok(Json(blocking(move || state.diversity.run_and_save(&df, &state.results)).await?))
}

// ============================================================================
// Skill gap
// ============================================================================

/// Completed trainings, as a list or one comma-separated string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Transcript {
    Tokens(Vec<String>),
    Text(String),
}

impl Transcript {
    fn into_tokens(self) -> Vec<String> {
        match self {
            Transcript::Tokens(tokens) => tokens,
            Transcript::Text(text) => text
                .split([',', ';', '\n'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SkillGapBody {
    pub data: Table,
    #[serde(default)]
    pub resume_texts: HashMap<String, String>,
    #[serde(default)]
    pub transcripts: HashMap<String, Transcript>,
    #[serde(default)]
    pub skill_course_map: Option<BTreeMap<String, String>>,
}

pub async fn analyze_skill_gap(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SkillGapBody>,
) -> Result<Json<SkillGapReport>> {
    let request = SkillGapRequest {
        employees: frame_from_columns(&body.data)?,
        resume_texts: body.resume_texts,
        transcripts: body
            .transcripts
            .into_iter()
            .map(|(id, t)| (id, t.into_tokens()))
            .collect(),
        skill_course_map: body.skill_course_map,
    };
    Ok(Json(blocking(move || state.skill_gap.run_and_save(&request, &state.results)).await?))
}

pub async fn required_skills(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, Vec<String>>> {
    Json(state.skill_gap.required_skills().clone())
}

// ============================================================================
// Planning
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlanningBody {
    pub headcount_plan: Table,
    #[serde(default)]
    pub hiring_pipeline: Table,
}

pub async fn forecast_plan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlanningBody>,
) -> Result<Json<PlanningReport>> {
    let request = PlanningRequest {
        headcount_plan: frame_from_columns(&body.headcount_plan)?,
        hiring_pipeline: frame_from_columns(&body.hiring_pipeline)?,
    };
    Ok(Json(blocking(move || state.planning.run_and_save(&request, &state.results)).await?))
}

// ============================================================================
// Simulation
// ============================================================================

fn full_participation() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct SimulationBody {
    pub data: Table,
    pub intervention: Intervention,
    #[serde(default = "full_participation")]
    pub participation_rate: f64,
}

pub async fn simulate_attrition(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimulationBody>,
) -> Result<Json<SimulationReport>> {
    let request = SimulationRequest {
        employees: frame_from_columns(&body.data)?,
        intervention: body.intervention,
        participation_rate: body.participation_rate,
    };
    Ok(Json(blocking(move || state.simulation.run_and_save(&request, &state.results)).await?))
}

pub async fn list_interventions() -> Json<BTreeMap<String, ImpactRange>> {
    Json(intervention_catalog())
}

// ============================================================================
// Productivity
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductivityBody {
    #[serde(default)]
    pub time_logs: Table,
    #[serde(default)]
    pub task_logs: Table,
    #[serde(default)]
    pub now: Option<NaiveDateTime>,
}

pub async fn analyze_productivity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProductivityBody>,
) -> Result<Json<ProductivityReport>> {
    let request = ProductivityRequest {
        time_logs: frame_from_columns(&body.time_logs)?,
        task_logs: frame_from_columns(&body.task_logs)?,
        now: body.now,
    };
    Ok(Json(blocking(move || state.productivity.run_and_save(&request, &state.results)).await?))
}

// ============================================================================
// System
// ============================================================================

pub async fn stored_result(
    State(state): State<Arc<AppState>>,
    Path(agent): Path<String>,
) -> Result<Json<Value>> {
    if state.registry.get(&agent).is_none() {
        return Err(ServerError::NotFound(format!("unknown agent '{agent}'")));
    }
    let stored = state.results.load::<Value>(&agent)?;
    stored
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(format!("no stored result for '{agent}'")))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_trained": state.attrition.model().is_trained(),
        "uptime_secs": (chrono::Utc::now() - state.started_at).num_seconds(),
    }))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "agents": state.registry.entries(),
        "endpoints": {
            "attrition": ["POST /api/attrition/analyze", "POST /api/attrition/train", "GET /api/attrition/feature-importance"],
            "diversity": ["POST /api/diversity/analyze"],
            "skill_gap": ["POST /api/skill-gap/analyze", "GET /api/skill-gap/required-skills"],
            "planning": ["POST /api/planning/forecast"],
            "simulation": ["POST /api/simulation/attrition", "GET /api/simulation/interventions"],
            "productivity": ["POST /api/productivity/analyze"],
            "results": ["GET /api/results/:agent"],
            "system": ["GET /api/health"],
        },
    }))
}
