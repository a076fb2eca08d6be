mod error;
mod requester;
mod transactions;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use ethfetch_core::LookupService;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub lookup: LookupService,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    Router::new()
        .route("/lime/health", get(health))
        .route("/lime/eth", get(transactions::get_by_hashes))
        .route("/lime/eth/{rlphex}", get(transactions::get_by_encoded_payload))
        .route("/lime/all", get(transactions::get_all))
        .route("/lime/my", get(transactions::get_mine))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> error::AppError {
    error::AppError::NotFound("route not found".to_string())
}
