//! Query orchestration: question → embedding → vector search → answer.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use paperchat_ingest::Embedder;
use paperchat_llm::{AnswerSynthesizer, Message};

use crate::vector_store::VectorStore;

use super::PipelineError;

/// A document that contributed context to an answer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SourceRef {
    /// Source filename the excerpt came from.
    pub source: String,
    /// Best similarity score among this document's retrieved excerpts.
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    synthesizer: Arc<AnswerSynthesizer>,
    search_limit: usize,
    context_top_k: usize,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        synthesizer: Arc<AnswerSynthesizer>,
        search_limit: usize,
        context_top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            synthesizer,
            search_limit,
            context_top_k,
        }
    }

    /// Retrieve the closest chunks to `question` and synthesize an answer
    /// from the top few. Retrieval over-fetches (`search_limit`) and only
    /// `context_top_k` excerpts reach the model.
    pub async fn answer(
        &self,
        question: &str,
        collection: &str,
        history: &[Message],
    ) -> Result<Answer, PipelineError> {
        let embeddings = self.embedder.embed_batch(&[question]).await?;
        let embedding = embeddings.into_iter().next().ok_or(PipelineError::EmptyEmbedding)?;

        let hits = self
            .store
            .search(collection, &embedding, self.search_limit)
            .await?;
        let top = &hits[..self.context_top_k.min(hits.len())];
        info!(
            "Retrieved {} chunks from '{}', using top {}",
            hits.len(),
            collection,
            top.len()
        );

        let contexts: Vec<String> = top.iter().map(|hit| hit.text.clone()).collect();

        // Hits arrive best-first, so the first occurrence of a source
        // carries its best score.
        let mut sources: Vec<SourceRef> = Vec::new();
        for hit in top {
            if !sources.iter().any(|s| s.source == hit.source) {
                sources.push(SourceRef {
                    source: hit.source.clone(),
                    score: hit.score,
                });
            }
        }

        let answer = self
            .synthesizer
            .synthesize(question, &contexts, history)
            .await?;
        Ok(Answer { answer, sources })
    }
}
