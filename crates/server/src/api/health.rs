//! Health endpoint.
//!
//! SRP: server liveness and a glance at runtime state.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

// ── GET /health ───────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Collection `/ask` currently serves, if any.
    pub active_collection: Option<String>,
    /// Exchanges held in conversation memory.
    pub memory_exchanges: usize,
}

/// GET /health
///
/// Liveness check plus which collection is active and how much
/// conversation memory has accumulated.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: "0.1.0",
        active_collection: state.active_collection.read().await.clone(),
        memory_exchanges: state.memory.len().await,
    })
}
