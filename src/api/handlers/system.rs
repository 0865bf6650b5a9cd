use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::api::{
    state::AppState,
    types::{EnvironmentHealth, HealthResponse},
};
use crate::engine::query;

/// GET /healthz -- liveness probe
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// GET /health -- per-environment mirror counters
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let environments: Vec<EnvironmentHealth> = state
        .environments
        .iter()
        .map(|ctx| EnvironmentHealth::from(query::stats(ctx)))
        .collect();

    let status = if environments.iter().all(|env| env.ticks_completed > 0) {
        "ok"
    } else {
        "starting"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        uptime_secs: state.uptime_seconds(),
        environments,
    })
}
