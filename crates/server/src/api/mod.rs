//! HTTP endpoint handlers.
//!
//! One sub-module per endpoint area. The shared error shape and the
//! guard helpers for half-configured deployments live here in mod.rs.

mod ask;
pub mod doc;
mod health;
mod ingest;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

// ── Shared types ─────────────────────────────────────────────────

/// Error body carried by every non-2xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ── Re-exports ───────────────────────────────────────────────────
// Preserves flat `api::foo` import paths used by router registration.

pub use ask::{ask, clear, history};
pub use health::health;
pub use ingest::ingest;
