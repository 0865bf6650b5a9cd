use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::BTreeMap;

use crate::api::{state::AppState, types::ApiError};
use crate::domain::{Category, HistoryEntry, Payload};
use crate::engine::query;

fn list(state: &AppState, cluster: &str, category: Category) -> Result<Json<Vec<Payload>>, ApiError> {
    let ctx = state.environment(cluster)?;
    Ok(Json(query::category_payloads(ctx, category)))
}

/// GET /:cluster/game
pub async fn get_games(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
) -> Result<Json<Vec<Payload>>, ApiError> {
    list(&state, &cluster, Category::Game)
}

/// GET /:cluster/round
pub async fn get_rounds(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
) -> Result<Json<Vec<Payload>>, ApiError> {
    list(&state, &cluster, Category::Round)
}

/// GET /:cluster/vault
pub async fn get_vaults(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
) -> Result<Json<Vec<Payload>>, ApiError> {
    list(&state, &cluster, Category::Vault)
}

/// GET /:cluster/history
pub async fn get_histories(
    State(state): State<AppState>,
    Path(cluster): Path<String>,
) -> Result<Json<BTreeMap<String, HistoryEntry>>, ApiError> {
    let ctx = state.environment(&cluster)?;
    Ok(Json(query::histories(ctx)))
}
