pub mod chunker;
pub mod layout;
pub mod md;
pub mod pdf;
pub mod recursive;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid segment: {0}")]
    InvalidSegment(String),

    #[error("analysis still running after {polls} polls")]
    Timeout { polls: u32 },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed: {0}")]
    PdfError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One level of a markdown heading hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1 = `#`, 2 = `##`, 3 = `###`.
    pub level: u8,
    pub title: String,
}

/// A header-delimited slice of a document, in document order.
///
/// `content` holds the section text only; the heading lines themselves live
/// in `heading_path`. Table and figure regions appear inline as literal
/// `<table>` / `<figure>` markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Heading hierarchy active at this segment (outermost first).
    pub heading_path: Vec<Heading>,
    pub content: String,
}

/// A page of locally extracted text (fallback path, no layout analysis).
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    pub text: String,
}

/// Source of header-delimited segments for a document.
///
/// The production implementation calls Azure Document Intelligence
/// ([`layout::AzureSegmentSource`]); tests substitute canned segments.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn load_segments(&self, bytes: &[u8], filename: &str) -> Result<Vec<Segment>, SegmentError>;
}
