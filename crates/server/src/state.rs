use std::sync::Arc;
use tokio::sync::RwLock;

use paperchat_core::config::Config;
use paperchat_ingest::{Embedder, SegmentSource};
use paperchat_llm::AnswerSynthesizer;

use crate::memory::ConversationMemory;
use crate::vector_store::VectorStore;

pub struct AppState {
    pub config: Config,
    /// `None` when Document Intelligence is not configured.
    pub segment_source: Option<Arc<dyn SegmentSource>>,
    /// `None` when no embedding provider is configured.
    pub embedder: Option<Arc<dyn Embedder>>,
    pub store: Arc<dyn VectorStore>,
    /// `None` when no answer model is configured.
    pub synthesizer: Option<Arc<AnswerSynthesizer>>,
    pub memory: ConversationMemory,
    /// Collection served by `/ask`, set at startup or by the latest ingest.
    pub active_collection: RwLock<Option<String>>,
}
