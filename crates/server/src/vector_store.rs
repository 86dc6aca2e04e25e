//! Vector store access over the Milvus HTTP API v2.
//!
//! The trait is the seam: the ingest and query pipelines only see
//! `ensure_collection` / `insert_chunks` / `search`, so tests swap in an
//! in-memory fake and the Milvus wiring stays in one place.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use paperchat_core::config::MilvusConfig;

// ── Types ──────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Milvus API error: {0}")]
    Api(String),

    #[error("unexpected Milvus response: {0}")]
    Parse(String),
}

/// One embedded chunk ready for insertion.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub text: String,
    pub embedding: Vec<f32>,
    /// Filename the chunk came from.
    pub source: String,
}

/// One search result, highest score first.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub text: String,
    pub source: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection with the fixed chunk schema if it does not exist.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<(), StoreError>;

    /// Insert chunk records, returning how many the store accepted.
    async fn insert_chunks(&self, name: &str, chunks: Vec<ChunkRecord>) -> Result<usize, StoreError>;

    /// Inner-product similarity search over the `embeddings` field.
    async fn search(&self, name: &str, embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>, StoreError>;
}

// ── Milvus implementation ──────────────────────────

pub struct MilvusStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MilvusEnvelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

impl MilvusStore {
    pub fn from_config(config: &MilvusConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    /// POST a v2 API request and unwrap the `{code, message, data}` envelope.
    async fn post(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let mut request = self.client.post(format!("{}{}", self.base_url, path)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!("{path}: {status}: {text}")));
        }

        let envelope: MilvusEnvelope = response.json().await?;
        if envelope.code != 0 {
            return Err(StoreError::Api(format!(
                "{path}: code {}: {}",
                envelope.code,
                envelope.message.unwrap_or_default()
            )));
        }
        Ok(envelope.data)
    }

    async fn has_collection(&self, name: &str) -> Result<bool, StoreError> {
        let data = self
            .post(
                "/v2/vectordb/collections/has",
                &serde_json::json!({ "collectionName": name }),
            )
            .await?;
        Ok(data.get("has").and_then(Value::as_bool).unwrap_or(false))
    }
}

#[async_trait]
impl VectorStore for MilvusStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<(), StoreError> {
        if self.has_collection(name).await? {
            debug!("Collection '{name}' already exists");
            return Ok(());
        }

        self.post(
            "/v2/vectordb/collections/create",
            &create_collection_body(name, dimensions),
        )
        .await?;
        info!("Created collection '{name}' ({dimensions} dims, IP/IVF_FLAT)");
        Ok(())
    }

    async fn insert_chunks(&self, name: &str, chunks: Vec<ChunkRecord>) -> Result<usize, StoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let count = chunks.len();
        let data = self
            .post("/v2/vectordb/entities/insert", &insert_body(name, &chunks))
            .await?;
        let inserted = data
            .get("insertCount")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(count);
        debug!("Inserted {inserted} chunks into '{name}'");
        Ok(inserted)
    }

    async fn search(&self, name: &str, embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>, StoreError> {
        let data = self
            .post("/v2/vectordb/entities/search", &search_body(name, embedding, limit))
            .await?;

        let rows = data
            .as_array()
            .ok_or_else(|| StoreError::Parse("search data is not an array".into()))?;

        let hits = rows
            .iter()
            .map(|row| SearchHit {
                text: row.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
                source: row.get("source").and_then(Value::as_str).unwrap_or_default().to_string(),
                score: row.get("distance").and_then(Value::as_f64).unwrap_or_default() as f32,
            })
            .collect();
        Ok(hits)
    }
}

// ── Request bodies ─────────────────────────────────

/// Collection schema: auto-id Int64 key, chunk text, embedding vector, and
/// the source filename. The index is declared with the collection so inserts
/// never re-index.
fn create_collection_body(name: &str, dimensions: usize) -> Value {
    serde_json::json!({
        "collectionName": name,
        "schema": {
            "autoId": true,
            "enableDynamicField": false,
            "fields": [
                { "fieldName": "id", "dataType": "Int64", "isPrimary": true },
                {
                    "fieldName": "text",
                    "dataType": "VarChar",
                    "elementTypeParams": { "max_length": 50000 }
                },
                {
                    "fieldName": "embeddings",
                    "dataType": "FloatVector",
                    "elementTypeParams": { "dim": dimensions }
                },
                {
                    "fieldName": "source",
                    "dataType": "VarChar",
                    "elementTypeParams": { "max_length": 255 }
                }
            ]
        },
        "indexParams": [
            {
                "fieldName": "embeddings",
                "indexName": "embeddings_index",
                "metricType": "IP",
                "params": { "index_type": "IVF_FLAT", "nlist": 16384 }
            }
        ]
    })
}

fn insert_body(name: &str, chunks: &[ChunkRecord]) -> Value {
    let rows: Vec<Value> = chunks
        .iter()
        .map(|chunk| {
            serde_json::json!({
                "text": chunk.text,
                "embeddings": chunk.embedding,
                "source": chunk.source,
            })
        })
        .collect();
    serde_json::json!({ "collectionName": name, "data": rows })
}

fn search_body(name: &str, embedding: &[f32], limit: usize) -> Value {
    serde_json::json!({
        "collectionName": name,
        "data": [embedding],
        "annsField": "embeddings",
        "limit": limit,
        "outputFields": ["text", "source"],
        "searchParams": { "metricType": "IP" }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_declares_schema_and_index() {
        let body = create_collection_body("papers", 3072);

        assert_eq!(body["collectionName"], "papers");
        assert_eq!(body["schema"]["autoId"], true);

        let fields = body["schema"]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["fieldName"], "id");
        assert_eq!(fields[0]["isPrimary"], true);
        assert_eq!(fields[1]["elementTypeParams"]["max_length"], 50000);
        assert_eq!(fields[2]["dataType"], "FloatVector");
        assert_eq!(fields[2]["elementTypeParams"]["dim"], 3072);
        assert_eq!(fields[3]["fieldName"], "source");

        let index = &body["indexParams"][0];
        assert_eq!(index["metricType"], "IP");
        assert_eq!(index["params"]["index_type"], "IVF_FLAT");
        assert_eq!(index["params"]["nlist"], 16384);
    }

    #[test]
    fn insert_body_carries_one_row_per_chunk() {
        let chunks = vec![
            ChunkRecord {
                text: "chunk one".to_string(),
                embedding: vec![0.1, 0.2],
                source: "a.pdf".to_string(),
            },
            ChunkRecord {
                text: "chunk two".to_string(),
                embedding: vec![0.3, 0.4],
                source: "b.pdf".to_string(),
            },
        ];

        let body = insert_body("papers", &chunks);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["text"], "chunk one");
        assert_eq!(rows[0]["source"], "a.pdf");
        assert_eq!(rows[1]["embeddings"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn search_body_requests_text_and_source() {
        let body = search_body("papers", &[0.5, 0.6], 10);

        assert_eq!(body["collectionName"], "papers");
        assert_eq!(body["annsField"], "embeddings");
        assert_eq!(body["limit"], 10);
        assert_eq!(body["outputFields"], serde_json::json!(["text", "source"]));
        assert_eq!(body["searchParams"]["metricType"], "IP");
        // Query vector is nested: one search per request.
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn envelope_rejects_nonzero_code() {
        let envelope: MilvusEnvelope = serde_json::from_value(serde_json::json!({
            "code": 1100,
            "message": "collection not found"
        }))
        .unwrap();
        assert_eq!(envelope.code, 1100);
        assert_eq!(envelope.message.as_deref(), Some("collection not found"));
        assert!(envelope.data.is_null());
    }

    #[test]
    fn envelope_parses_search_data() {
        let envelope: MilvusEnvelope = serde_json::from_value(serde_json::json!({
            "code": 0,
            "data": [ { "text": "t", "source": "s.pdf", "distance": 0.87 } ]
        }))
        .unwrap();
        assert_eq!(envelope.code, 0);
        let rows = envelope.data.as_array().unwrap();
        assert_eq!(rows[0]["distance"], 0.87);
    }
}
