//! Ephemeral per-process conversation memory.
//!
//! Holds question/answer exchanges so follow-up questions can lean on earlier
//! turns. Cleared via `POST /clear`; not persisted across restarts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// One answered question, oldest exchanges first.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    #[schema(value_type = String)]
    pub asked_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct ConversationMemory {
    exchanges: RwLock<Vec<Exchange>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, question: String, answer: String) {
        let mut exchanges = self.exchanges.write().await;
        exchanges.push(Exchange {
            question,
            answer,
            asked_at: Utc::now(),
        });
    }

    pub async fn history(&self) -> Vec<Exchange> {
        self.exchanges.read().await.clone()
    }

    /// Drop all exchanges, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut exchanges = self.exchanges.write().await;
        let removed = exchanges.len();
        exchanges.clear();
        removed
    }

    pub async fn len(&self) -> usize {
        self.exchanges.read().await.len()
    }
}
