//! Ingestion and query orchestration.
//!
//! Both pipelines work purely against the `SegmentSource`, `Embedder` and
//! `VectorStore` traits plus the answer synthesizer, so they carry no HTTP
//! or Milvus detail of their own.

pub mod ingest;
pub mod query;

use std::path::PathBuf;

use thiserror::Error;

use paperchat_ingest::document::ExtractionError;
use paperchat_ingest::{EmbeddingError, SegmentError};
use paperchat_llm::LlmError;

use crate::vector_store::StoreError;

pub use ingest::{IngestPipeline, IngestSummary};
pub use query::{Answer, QueryPipeline, SourceRef};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("semantic chunking requested but Document Intelligence is not configured")]
    SemanticUnavailable,

    #[error("invalid collection name '{0}': must start with a letter or underscore and use only letters, digits, and underscores")]
    InvalidCollection(String),

    #[error("not a PDF file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("document analysis failed: {0}")]
    Segment(#[from] SegmentError),

    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store request failed: {0}")]
    Store(#[from] StoreError),

    #[error("answer synthesis failed: {0}")]
    Llm(#[from] LlmError),

    #[error("embedding provider returned no vector for the query")]
    EmptyEmbedding,
}
