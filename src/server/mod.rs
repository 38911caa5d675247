//! REST server
//!
//! Exposes every agent over JSON. Tables travel as column maps
//! (`{"column": [values...]}`) and agent work runs on the blocking pool.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
        }
    }
}

/// Start the server and serve until ctrl+c
pub async fn run_server(config: ServerConfig, app_config: AppConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    std::fs::create_dir_all(&app_config.paths.model_dir)?;
    std::fs::create_dir_all(&app_config.paths.results_dir)?;

    let state = Arc::new(AppState::new(app_config)?);
    info!(
        agents = state.registry.len(),
        model_trained = state.attrition.model().is_trained(),
        "Agents ready"
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Workforce analytics server listening");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl+c");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(!config.host.is_empty());
    }
}
