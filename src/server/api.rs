//! API route definitions

use std::sync::Arc;
use axum::{
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, state::AppState};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Visit / for the endpoint index or /api/health to check API status.",
        })),
    )
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": true,
            "message": "Method not allowed. Visit / for the supported methods.",
        })),
    )
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Attrition
        .route("/attrition/analyze", post(handlers::analyze_attrition))
        .route("/attrition/train", post(handlers::train_attrition))
        .route("/attrition/feature-importance", get(handlers::feature_importance))
        // Diversity
        .route("/diversity/analyze", post(handlers::analyze_diversity))
        // Skill gap
        .route("/skill-gap/analyze", post(handlers::analyze_skill_gap))
        .route("/skill-gap/required-skills", get(handlers::required_skills))
        // Planning
        .route("/planning/forecast", post(handlers::forecast_plan))
        // Simulation
        .route("/simulation/attrition", post(handlers::simulate_attrition))
        .route("/simulation/interventions", get(handlers::list_interventions))
        // Productivity
        .route("/productivity/analyze", post(handlers::analyze_productivity))
        // Stored reports
        .route("/results/:agent", get(handlers::stored_result))
        // System
        .route("/health", get(handlers::health_check))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405);

    // CORS_ORIGIN restricts cross-origin callers; unset or "*" allows all
    let cors = match std::env::var("CORS_ORIGIN") {
        Ok(origin) if !origin.is_empty() && origin != "*" => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .unwrap_or_else(|_| HeaderValue::from_static("*")),
            )
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(handlers::index))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
