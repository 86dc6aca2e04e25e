//! Azure Document Intelligence layout client.
//!
//! The layout model understands tables, figures and reading order, which is
//! what makes the semantic chunking path worth its latency. Analysis is
//! asynchronous on the Azure side: submit returns `202 Accepted` with an
//! `Operation-Location` header, which is then polled until the run settles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{md, Segment, SegmentError, SegmentSource};

pub struct DocIntelClient {
    client: Client,
    endpoint: String,
    key: String,
    model: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl DocIntelClient {
    pub fn new(
        endpoint: String,
        key: String,
        model: String,
        api_version: String,
        poll_interval_ms: u64,
        max_polls: u32,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint,
            key,
            model,
            api_version,
            poll_interval: Duration::from_millis(poll_interval_ms),
            max_polls,
        }
    }

    /// URL for submitting an analysis with markdown output.
    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}&outputContentFormat=markdown",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_version,
        )
    }

    /// Run layout analysis on a document and return its markdown rendering.
    pub async fn analyze_to_markdown(&self, bytes: &[u8]) -> Result<String, SegmentError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SegmentError::Api(format!("analyze submit: {status}: {body}")));
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                SegmentError::Api("analyze accepted without an Operation-Location header".into())
            })?;

        self.poll_result(&operation_url).await
    }

    async fn poll_result(&self, operation_url: &str) -> Result<String, SegmentError> {
        for poll in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.key)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(SegmentError::Api(format!("analyze poll: {status}: {body}")));
            }

            let operation: AnalyzeOperation = response.json().await?;
            debug!("analysis poll {}: status={}", poll + 1, operation.status);

            match operation.status.as_str() {
                "succeeded" => return markdown_content(operation),
                "failed" => {
                    let detail = operation
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(SegmentError::Api(format!("analysis failed: {detail}")));
                }
                // "notStarted" / "running"
                _ => continue,
            }
        }

        Err(SegmentError::Timeout { polls: self.max_polls })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    analyze_result: Option<AnalyzeResult>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    content: Option<String>,
}

/// A succeeded analysis must carry markdown content; anything else means
/// the document produced no usable segments.
fn markdown_content(operation: AnalyzeOperation) -> Result<String, SegmentError> {
    match operation.analyze_result.and_then(|r| r.content) {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(SegmentError::InvalidSegment(
            "analyzeResult.content missing or empty".into(),
        )),
    }
}

// ── SegmentSource over the layout client ────────────────────────────────────

pub struct AzureSegmentSource {
    client: DocIntelClient,
}

impl AzureSegmentSource {
    pub fn new(client: DocIntelClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SegmentSource for AzureSegmentSource {
    async fn load_segments(&self, bytes: &[u8], filename: &str) -> Result<Vec<Segment>, SegmentError> {
        debug!("layout analysis for {filename} ({} bytes)", bytes.len());
        let markdown = self.client.analyze_to_markdown(bytes).await?;
        Ok(md::split_markdown(&markdown))
    }
}
