use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::EnvironmentStats;
use crate::error::MirrorError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced to API clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<MirrorError> for ApiError {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::UnknownCluster(name) => ApiError::NotFound(format!("unknown environment `{name}`")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Health Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
    pub environments: Vec<EnvironmentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentHealth {
    pub cluster: String,
    pub vaults: usize,
    pub rounds: usize,
    pub games: usize,
    pub histories: usize,
    pub subscriptions: usize,
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
    pub last_tick: Option<DateTime<Utc>>,
}

impl From<EnvironmentStats> for EnvironmentHealth {
    fn from(stats: EnvironmentStats) -> Self {
        Self {
            cluster: stats.cluster.to_string(),
            vaults: stats.vaults,
            rounds: stats.rounds,
            games: stats.games,
            histories: stats.histories,
            subscriptions: stats.subscriptions,
            ticks_completed: stats.ticks_completed,
            ticks_skipped: stats.ticks_skipped,
            last_tick: stats.last_tick,
        }
    }
}
