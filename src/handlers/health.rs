use axum::{extract::State, Json};
use tracing::debug;

use crate::models::HealthResponse;
use crate::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint
pub async fn ready_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    let stats = state.hub.stats().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        message: format!("Service is ready ({} live connections)", stats.connections),
    })
}
