//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "paperchat API",
        version = "0.1.0",
        description = "Retrieval-augmented chat over PDF research papers: layout-aware chunking, vector search, and grounded answers.",
    ),
    tags(
        (name = "Health", description = "Server liveness and runtime state"),
        (name = "Ingest", description = "PDF chunking, embedding, and vector storage"),
        (name = "Chat", description = "Question answering and conversation memory"),
    ),
    paths(
        crate::api::health::health,
        crate::api::ingest::ingest,
        crate::api::ask::ask,
        crate::api::ask::history,
        crate::api::ask::clear,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::ingest::IngestRequest,
        crate::api::ingest::IngestResponse,
        crate::api::ask::AskRequest,
        crate::api::ask::AskResponse,
        crate::api::ask::HistoryResponse,
        crate::api::ask::ClearResponse,
        crate::memory::Exchange,
        crate::pipeline::query::SourceRef,
    ))
)]
pub struct ApiDoc;
