//! Integration tests for the HTTP JSON contract.
//!
//! Since `paperchat-server` is a binary crate (no lib.rs), we test the JSON
//! contract by defining mirror types and validating serialization roundtrips.
//! Live tests need a running server and are `#[ignore]`d for CI; run with
//! `cargo test -p paperchat-server -- --ignored`.

use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Mirror types matching the endpoint JSON contract ──────────────

const ANSWER_TEMPLATE_PATH: &str = "data/prompts/answer-system.md";

#[derive(Debug, Serialize, Deserialize)]
struct IngestRequest {
    file_path: String,
    #[serde(default)]
    is_directory: bool,
    #[serde(default = "default_semantic")]
    semantic_chunking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection_name: Option<String>,
}

fn default_semantic() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct IngestResponse {
    collection_name: String,
    documents_processed: usize,
    documents_failed: usize,
    total_chunks: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AskResponse {
    question: String,
    answer: String,
    sources: Vec<SourceRef>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SourceRef {
    source: String,
    score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryResponse {
    exchanges: Vec<Exchange>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Exchange {
    question: String,
    answer: String,
    asked_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClearResponse {
    status: String,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    active_collection: Option<String>,
    memory_exchanges: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Helpers ───────────────────────────────────────────────────────

/// Resolve a path relative to the cargo workspace root.
fn workspace_root() -> std::path::PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

// ── Unit tests (always run) ──────────────────────────────────────

#[test]
fn ingest_request_defaults() {
    // Only file_path given: directory off, semantic chunking on.
    let minimal = r#"{"file_path": "papers/attention.pdf"}"#;
    let parsed: IngestRequest = serde_json::from_str(minimal).unwrap();

    assert_eq!(parsed.file_path, "papers/attention.pdf");
    assert!(!parsed.is_directory, "is_directory must default to false");
    assert!(parsed.semantic_chunking, "semantic_chunking must default to true");
    assert!(parsed.collection_name.is_none());
}

#[test]
fn ingest_request_full_roundtrip() {
    let request = IngestRequest {
        file_path: "papers/".to_string(),
        is_directory: true,
        semantic_chunking: false,
        collection_name: Some("ml_papers".to_string()),
    };

    let json = serde_json::to_string(&request).unwrap();
    let parsed: IngestRequest = serde_json::from_str(&json).unwrap();

    assert!(parsed.is_directory);
    assert!(!parsed.semantic_chunking);
    assert_eq!(parsed.collection_name.as_deref(), Some("ml_papers"));
}

#[test]
fn ingest_request_rejects_missing_path() {
    let result = serde_json::from_str::<IngestRequest>(r#"{"is_directory": true}"#);
    assert!(result.is_err(), "file_path must be required");
}

#[test]
fn ask_response_roundtrip_with_sources() {
    let response = AskResponse {
        question: "What is attention?".to_string(),
        answer: "Attention weighs token relevance.".to_string(),
        sources: vec![
            SourceRef { source: "attention.pdf".to_string(), score: 0.87 },
            SourceRef { source: "bert.pdf".to_string(), score: 0.61 },
        ],
    };

    let json = serde_json::to_string(&response).unwrap();
    let parsed: AskResponse = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.sources.len(), 2);
    assert_eq!(parsed.sources[0].source, "attention.pdf");
    assert!((parsed.sources[0].score - 0.87).abs() < 1e-6);
}

#[test]
fn wrong_shape_rejected() {
    let garbage = "this is not json at all!!!";
    assert!(serde_json::from_str::<AskResponse>(garbage).is_err());

    let wrong_shape = r#"{"foo": "bar"}"#;
    assert!(serde_json::from_str::<AskResponse>(wrong_shape).is_err());
    assert!(serde_json::from_str::<HealthResponse>(wrong_shape).is_err());
}

#[test]
fn error_body_exposes_single_error_field() {
    let parsed: ErrorResponse =
        serde_json::from_str(r#"{"error": "Path does not exist: nope.pdf"}"#).unwrap();
    assert!(parsed.error.contains("nope.pdf"));
}

#[test]
fn history_exchange_carries_timestamp() {
    let json = r#"{
        "exchanges": [
            {"question": "q1", "answer": "a1", "asked_at": "2025-06-01T12:00:00Z"}
        ]
    }"#;
    let parsed: HistoryResponse = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.exchanges.len(), 1);
    assert!(parsed.exchanges[0].asked_at.starts_with("2025-06-01"));
}

#[test]
fn answer_template_exists_with_placeholders() {
    let template_path = workspace_root().join(ANSWER_TEMPLATE_PATH);
    assert!(
        template_path.exists(),
        "answer template must exist at {}",
        template_path.display()
    );

    let content = std::fs::read_to_string(&template_path)
        .unwrap_or_else(|e| panic!("failed to read template: {e}"));

    assert_eq!(
        content.matches("<<<context>>>").count(),
        1,
        "template must contain <<<context>>> exactly once"
    );
    assert_eq!(
        content.matches("<<<history>>>").count(),
        1,
        "template must contain <<<history>>> exactly once"
    );
}

// ── Live tests (require a running server) ────────────────────────
//
// Start the server first: cargo run -p paperchat-server serve
// Then: cargo test -p paperchat-server -- --ignored

fn live_base_url() -> String {
    std::env::var("PAPERCHAT_TEST_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:7777".to_string())
}

#[ignore]
#[tokio::test]
async fn live_health_reports_ok() {
    let resp = reqwest::get(format!("{}/health", live_base_url()))
        .await
        .expect("failed to reach server");
    assert!(resp.status().is_success());

    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, "0.1.0");
}

#[ignore]
#[tokio::test]
async fn live_clear_then_history_is_empty() {
    let client = reqwest::Client::new();
    let base_url = live_base_url();

    let resp = client
        .post(format!("{base_url}/clear"))
        .send()
        .await
        .expect("failed to reach server");
    assert!(resp.status().is_success());
    let body: ClearResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "success");

    let resp = reqwest::get(format!("{base_url}/history")).await.unwrap();
    let body: HistoryResponse = resp.json().await.unwrap();
    assert!(body.exchanges.is_empty());
}

#[ignore]
#[tokio::test]
async fn live_ask_round_trip() {
    let client = reqwest::Client::new();
    let base_url = live_base_url();

    let resp = client
        .post(format!("{base_url}/ask"))
        .json(&AskRequest {
            question: "What are these papers about?".to_string(),
        })
        .send()
        .await
        .expect("failed to reach server");

    if resp.status().as_u16() == 503 {
        eprintln!("Embedder/LLM not configured or nothing ingested, skipping test");
        return;
    }

    assert!(resp.status().is_success(), "ask returned {}", resp.status());
    let body: AskResponse = resp.json().await.unwrap();
    assert!(!body.answer.is_empty(), "expected a non-empty answer");
}
