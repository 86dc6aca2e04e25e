//! Question answering and conversation memory endpoints.
//!
//! SRP: retrieval-grounded chat over the active collection.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use paperchat_llm::Message;

use crate::memory::Exchange;
use crate::pipeline::{QueryPipeline, SourceRef};
use crate::state::AppState;

use super::{api_error, ApiError, ErrorResponse};

// ── POST /ask ─────────────────────────────────────────────────────

#[derive(Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize, ToSchema)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// POST /ask
///
/// Answers a question from the active collection, grounded in the closest
/// retrieved chunks and the conversation so far. The exchange is appended
/// to memory on success.
#[utoipa::path(
    post,
    path = "/ask",
    tag = "Chat",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Grounded answer with source attributions", body = AskResponse),
        (status = 400, description = "Empty question", body = ErrorResponse),
        (status = 503, description = "Embedder or answer model not configured, or nothing ingested", body = ErrorResponse),
        (status = 500, description = "Retrieval or synthesis failure", body = ErrorResponse),
    )
)]
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Question must not be empty."));
    }

    let embedder = state.embedder.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Embedding provider not configured. Set OPENAI_API_KEY or EMBEDDING_PROVIDER.",
        )
    })?;
    let synthesizer = state.synthesizer.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Answer model not configured. Set GEMINI_KEY or LLM_PROVIDER.",
        )
    })?;
    let collection = state
        .active_collection
        .read()
        .await
        .clone()
        .ok_or_else(|| {
            api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "No documents ingested yet. POST /ingest first or set MILVUS_COLLECTION.",
            )
        })?;

    let history: Vec<Message> = state
        .memory
        .history()
        .await
        .into_iter()
        .flat_map(|e| [Message::user(e.question), Message::assistant(e.answer)])
        .collect();

    let pipeline = QueryPipeline::new(
        embedder.clone(),
        state.store.clone(),
        synthesizer.clone(),
        state.config.chunking.search_limit,
        state.config.chunking.context_top_k,
    );
    let result = pipeline
        .answer(&question, &collection, &history)
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to answer: {e}"),
            )
        })?;

    state.memory.record(question.clone(), result.answer.clone()).await;

    Ok(Json(AskResponse {
        question,
        answer: result.answer,
        sources: result.sources,
    }))
}

// ── GET /history ──────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub exchanges: Vec<Exchange>,
}

/// GET /history
///
/// Returns every question/answer exchange recorded since startup or the
/// last `/clear`.
#[utoipa::path(
    get,
    path = "/history",
    tag = "Chat",
    responses(
        (status = 200, description = "Conversation so far", body = HistoryResponse)
    )
)]
pub async fn history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        exchanges: state.memory.history().await,
    })
}

// ── POST /clear ───────────────────────────────────────────────────

#[derive(Serialize, ToSchema)]
pub struct ClearResponse {
    pub status: &'static str,
    pub message: String,
}

/// POST /clear
///
/// Empties conversation memory. Ingested documents are untouched.
#[utoipa::path(
    post,
    path = "/clear",
    tag = "Chat",
    responses(
        (status = 200, description = "Memory cleared", body = ClearResponse)
    )
)]
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    let removed = state.memory.clear().await;
    info!("Cleared {removed} exchanges from conversation memory");
    Json(ClearResponse {
        status: "success",
        message: format!("Cleared {removed} exchanges from conversation memory."),
    })
}
