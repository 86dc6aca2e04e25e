pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use paperchat_core::config::{EmbeddingConfig, OllamaConfig};

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedder not configured: {0}")]
    NotConfigured(String),
}

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text, in order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}

/// Create the embedding backend named by config.
pub fn create_embedder(
    embedding: &EmbeddingConfig,
    ollama: &OllamaConfig,
) -> Result<Box<dyn Embedder>, EmbeddingError> {
    match embedding.provider.as_str() {
        "openai" => {
            let api_key = embedding
                .openai_api_key
                .as_ref()
                .ok_or_else(|| EmbeddingError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Box::new(OpenAiEmbedder::new(
                api_key.clone(),
                embedding.model.clone(),
                embedding.openai_base_url.clone(),
                embedding.dimensions as usize,
            )))
        }
        "ollama" => Ok(Box::new(OllamaEmbedder::new(
            ollama.url.clone(),
            ollama.embedding_model.clone(),
            embedding.dimensions as usize,
        ))),
        other => Err(EmbeddingError::NotConfigured(format!(
            "unknown embedding provider: '{other}'"
        ))),
    }
}
