//! Document ingestion endpoint.
//!
//! SRP: feed PDFs through the chunk/embed/insert pipeline.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pipeline::{IngestPipeline, PipelineError};
use crate::state::AppState;

use super::{api_error, ApiError, ErrorResponse};

// ── POST /ingest ──────────────────────────────────────────────────

#[derive(Deserialize, ToSchema)]
pub struct IngestRequest {
    /// PDF file, or a directory of PDFs when `is_directory` is set.
    pub file_path: String,
    #[serde(default)]
    pub is_directory: bool,
    /// Layout-aware chunking via Document Intelligence; `false` falls back
    /// to local text extraction with the recursive splitter.
    #[serde(default = "default_semantic")]
    pub semantic_chunking: bool,
    /// Overrides the configured or generated collection name.
    pub collection_name: Option<String>,
}

fn default_semantic() -> bool {
    true
}

#[derive(Serialize, ToSchema)]
pub struct IngestResponse {
    pub collection_name: String,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub total_chunks: usize,
}

/// POST /ingest
///
/// Chunks, embeds, and stores one PDF or a directory of PDFs. The target
/// collection becomes the active collection served by `/ask`.
#[utoipa::path(
    post,
    path = "/ingest",
    tag = "Ingest",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Ingest summary", body = IngestResponse),
        (status = 400, description = "Bad path, file type, or collection name", body = ErrorResponse),
        (status = 503, description = "Embedding or layout analysis not configured", body = ErrorResponse),
        (status = 500, description = "Pipeline failure", body = ErrorResponse),
    )
)]
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let embedder = state.embedder.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Embedding provider not configured. Set OPENAI_API_KEY or EMBEDDING_PROVIDER.",
        )
    })?;

    let path = std::path::Path::new(&req.file_path);
    let metadata = tokio::fs::metadata(path).await.map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Path does not exist: {}", req.file_path),
        )
    })?;
    if req.is_directory && !metadata.is_dir() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Not a directory: {}", req.file_path),
        ));
    }
    if !req.is_directory && !metadata.is_file() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Not a file: {}", req.file_path),
        ));
    }

    let pipeline = IngestPipeline::new(
        state.segment_source.clone(),
        embedder.clone(),
        state.store.clone(),
        state.config.chunking.clone(),
        state.config.embedding.batch_size as usize,
        state.config.milvus.collection.clone(),
    );

    let collection = req.collection_name.as_deref();
    let result = if req.is_directory {
        pipeline
            .ingest_directory(path, collection, req.semantic_chunking)
            .await
    } else {
        pipeline
            .ingest_file(path, collection, req.semantic_chunking)
            .await
    };
    let summary = result.map_err(map_ingest_error)?;

    *state.active_collection.write().await = Some(summary.collection.clone());

    Ok(Json(IngestResponse {
        collection_name: summary.collection,
        documents_processed: summary.documents_processed,
        documents_failed: summary.documents_failed,
        total_chunks: summary.total_chunks,
    }))
}

fn map_ingest_error(e: PipelineError) -> ApiError {
    match &e {
        PipelineError::SemanticUnavailable => api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("{e}. Set AZURE_DOC_ENDPOINT and AZURE_DOC_KEY, or pass semantic_chunking=false."),
        ),
        PipelineError::InvalidCollection(_) | PipelineError::UnsupportedFile(_) => {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        PipelineError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        _ => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Ingest failed: {e}"),
        ),
    }
}
