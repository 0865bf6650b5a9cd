use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // System endpoints
        .route("/health", get(handlers::health_handler))
        .route("/healthz", get(handlers::liveness_handler))
        // Mirror endpoints
        .route("/:cluster/game", get(handlers::get_games))
        .route("/:cluster/round", get(handlers::get_rounds))
        .route("/:cluster/vault", get(handlers::get_vaults))
        .route("/:cluster/history", get(handlers::get_histories))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
