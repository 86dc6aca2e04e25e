//! Ingest orchestration: PDFs → chunks → embeddings → vector store.
//!
//! Two chunking paths. The semantic path sends the document through layout
//! analysis and the header-band assembler; the fallback path extracts text
//! locally and applies the recursive character splitter. Per-document
//! failures inside a directory batch are counted, not fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use paperchat_core::config::ChunkingConfig;
use paperchat_ingest::document::pdf::extract_pdf;
use paperchat_ingest::document::recursive::RecursiveSplitter;
use paperchat_ingest::{assemble_chunks, ChunkConfig, Embedder, SegmentSource};

use crate::vector_store::{ChunkRecord, VectorStore};

use super::PipelineError;

/// Outcome of one ingest run.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub collection: String,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub total_chunks: usize,
}

pub struct IngestPipeline {
    segment_source: Option<Arc<dyn SegmentSource>>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
    batch_size: usize,
    default_collection: Option<String>,
}

impl IngestPipeline {
    pub fn new(
        segment_source: Option<Arc<dyn SegmentSource>>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chunking: ChunkingConfig,
        batch_size: usize,
        default_collection: Option<String>,
    ) -> Self {
        Self {
            segment_source,
            embedder,
            store,
            chunking,
            batch_size: batch_size.max(1),
            default_collection,
        }
    }

    /// Ingest every `.pdf` directly inside `dir` (non-recursive) into one
    /// collection. A document that fails to process is logged and counted
    /// in `documents_failed`; the rest of the batch continues.
    pub async fn ingest_directory(
        &self,
        dir: &Path,
        collection: Option<&str>,
        semantic: bool,
    ) -> Result<IngestSummary, PipelineError> {
        let collection = self.resolve_collection(collection)?;
        if semantic && self.segment_source.is_none() {
            return Err(PipelineError::SemanticUnavailable);
        }

        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| PipelineError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut pdf_paths: Vec<PathBuf> = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| PipelineError::Io {
            path: dir.to_path_buf(),
            source: e,
        })? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && is_pdf(&path) {
                pdf_paths.push(path);
            }
        }
        pdf_paths.sort();
        info!("Found {} PDF files in {}", pdf_paths.len(), dir.display());

        self.store
            .ensure_collection(&collection, self.embedder.dimensions())
            .await?;

        let mut documents_processed = 0;
        let mut documents_failed = 0;
        let mut total_chunks = 0;
        for path in &pdf_paths {
            match self.process_file(path, &collection, semantic).await {
                Ok(chunks) => {
                    documents_processed += 1;
                    total_chunks += chunks;
                }
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    documents_failed += 1;
                }
            }
        }

        info!(
            "Ingest complete: {} documents ({} failed), {} chunks into '{}'",
            documents_processed, documents_failed, total_chunks, collection
        );
        Ok(IngestSummary {
            collection,
            documents_processed,
            documents_failed,
            total_chunks,
        })
    }

    /// Ingest a single PDF; any other file type is rejected. Unlike the
    /// directory batch, a processing failure here is the caller's problem
    /// and propagates as an error.
    pub async fn ingest_file(
        &self,
        path: &Path,
        collection: Option<&str>,
        semantic: bool,
    ) -> Result<IngestSummary, PipelineError> {
        if !is_pdf(path) {
            return Err(PipelineError::UnsupportedFile(path.to_path_buf()));
        }
        let collection = self.resolve_collection(collection)?;
        if semantic && self.segment_source.is_none() {
            return Err(PipelineError::SemanticUnavailable);
        }

        self.store
            .ensure_collection(&collection, self.embedder.dimensions())
            .await?;
        let total_chunks = self.process_file(path, &collection, semantic).await?;

        Ok(IngestSummary {
            collection,
            documents_processed: 1,
            documents_failed: 0,
            total_chunks,
        })
    }

    /// Chunk, embed, and insert one document. Returns the chunk count.
    async fn process_file(
        &self,
        path: &Path,
        collection: &str,
        semantic: bool,
    ) -> Result<usize, PipelineError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let texts = if semantic {
            let source = self
                .segment_source
                .as_ref()
                .ok_or(PipelineError::SemanticUnavailable)?;
            let segments = source.load_segments(&bytes, &filename).await?;
            let config = ChunkConfig {
                min_chars: self.chunking.min_chars,
                max_chars: self.chunking.max_chars,
            };
            assemble_chunks(segments, &config)
                .iter()
                .map(|chunk| chunk.render())
                .collect::<Vec<_>>()
        } else {
            let pages = extract_pdf(&bytes)?;
            let splitter = RecursiveSplitter::new(
                self.chunking.fallback_chunk_size,
                self.chunking.fallback_chunk_overlap,
            );
            // Page text is flattened to a single line before splitting.
            pages
                .iter()
                .flat_map(|page| splitter.split(&page.text.replace('\n', " ")))
                .collect()
        };

        if texts.is_empty() {
            warn!("'{filename}' produced no chunks, skipping insert");
            return Ok(0);
        }
        info!(
            "'{}': {} chunks ({})",
            filename,
            texts.len(),
            if semantic { "semantic" } else { "fallback" }
        );

        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let batch_count = (refs.len() + self.batch_size - 1) / self.batch_size;
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(refs.len());
        for (i, batch) in refs.chunks(self.batch_size).enumerate() {
            info!("Embedding batch {}/{} ({} chunks)", i + 1, batch_count, batch.len());
            let batch_embeddings = self.embedder.embed_batch(batch).await?;
            embeddings.extend(batch_embeddings);
        }

        let records: Vec<ChunkRecord> = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| ChunkRecord {
                text,
                embedding,
                source: filename.clone(),
            })
            .collect();

        let count = records.len();
        self.store.insert_chunks(collection, records).await?;
        Ok(count)
    }

    /// Explicit request name > configured default > random generated name.
    fn resolve_collection(&self, requested: Option<&str>) -> Result<String, PipelineError> {
        if let Some(name) = requested {
            if !is_valid_collection_name(name) {
                return Err(PipelineError::InvalidCollection(name.to_string()));
            }
            return Ok(name.to_string());
        }
        if let Some(name) = &self.default_collection {
            return Ok(name.clone());
        }
        Ok(random_collection_name())
    }
}

/// Extension check shared by the directory filter and single-file ingest.
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

// ── Collection naming ──────────────────────────────

const COLLECTION_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";

/// A fresh Milvus-safe name: 'a' followed by 5..=32 random word characters.
fn random_collection_name() -> String {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(5..=32);
    let mut name = String::with_capacity(len + 1);
    name.push('a');
    for _ in 0..len {
        name.push(COLLECTION_CHARS[rng.gen_range(0..COLLECTION_CHARS.len())] as char);
    }
    name
}

fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 255 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use paperchat_ingest::{EmbeddingError, Heading, Segment, SegmentError};

    use crate::vector_store::{SearchHit, StoreError};

    /// Canned segment source: `per_file` segments of ~600 chars each, so the
    /// assembler emits one chunk per segment. Filenames containing `fail_on`
    /// simulate an analysis failure.
    struct FakeSegments {
        per_file: usize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SegmentSource for FakeSegments {
        async fn load_segments(
            &self,
            _bytes: &[u8],
            filename: &str,
        ) -> Result<Vec<Segment>, SegmentError> {
            if let Some(marker) = self.fail_on {
                if filename.contains(marker) {
                    return Err(SegmentError::Api("simulated analysis failure".into()));
                }
            }
            Ok((0..self.per_file)
                .map(|i| Segment {
                    heading_path: vec![Heading {
                        level: 1,
                        title: format!("{filename} section {i}"),
                    }],
                    content: format!("text {i} of {filename} ").repeat(40),
                })
                .collect())
        }
    }

    struct FakeEmbedder {
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                batch_sizes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.batch_sizes.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct FakeStore {
        ensured: Mutex<Vec<(String, usize)>>,
        inserted: Mutex<Vec<(String, Vec<ChunkRecord>)>>,
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<(), StoreError> {
            self.ensured.lock().unwrap().push((name.to_string(), dimensions));
            Ok(())
        }

        async fn insert_chunks(
            &self,
            name: &str,
            chunks: Vec<ChunkRecord>,
        ) -> Result<usize, StoreError> {
            let count = chunks.len();
            self.inserted.lock().unwrap().push((name.to_string(), chunks));
            Ok(count)
        }

        async fn search(
            &self,
            _name: &str,
            _embedding: &[f32],
            _limit: usize,
        ) -> Result<Vec<SearchHit>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn pipeline(
        source: Option<FakeSegments>,
        embedder: Arc<FakeEmbedder>,
        store: Arc<FakeStore>,
        batch_size: usize,
    ) -> IngestPipeline {
        IngestPipeline::new(
            source.map(|s| Arc::new(s) as Arc<dyn SegmentSource>),
            embedder,
            store,
            ChunkingConfig {
                min_chars: 500,
                max_chars: 1000,
                fallback_chunk_size: 1000,
                fallback_chunk_overlap: 300,
                search_limit: 10,
                context_top_k: 5,
            },
            batch_size,
            None,
        )
    }

    fn write_files(dir: &tempfile::TempDir, names: &[&str]) {
        for name in names {
            std::fs::write(dir.path().join(name), b"placeholder bytes").unwrap();
        }
    }

    #[tokio::test]
    async fn directory_ingest_picks_up_only_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["a.pdf", "b.pdf", "notes.txt", "image.png"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: None }),
            embedder.clone(),
            store.clone(),
            64,
        );

        let summary = pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap();

        assert_eq!(summary.collection, "papers");
        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.documents_failed, 0);
        assert_eq!(summary.total_chunks, 2);

        let inserted = store.inserted.lock().unwrap();
        let sources: Vec<&str> = inserted
            .iter()
            .flat_map(|(_, chunks)| chunks.iter().map(|c| c.source.as_str()))
            .collect();
        assert_eq!(sources, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn collection_is_ensured_once_with_embedder_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["a.pdf", "b.pdf", "c.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: None }),
            embedder,
            store.clone(),
            64,
        );

        pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap();

        let ensured = store.ensured.lock().unwrap();
        assert_eq!(ensured.as_slice(), &[("papers".to_string(), 2)]);
    }

    #[tokio::test]
    async fn failing_document_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["a.pdf", "bad.pdf", "c.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: Some("bad") }),
            embedder,
            store.clone(),
            64,
        );

        let summary = pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap();

        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.documents_failed, 1);
        assert_eq!(summary.total_chunks, 2);
    }

    #[tokio::test]
    async fn empty_directory_reports_zero_documents() {
        let dir = tempfile::tempdir().unwrap();

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: None }),
            embedder,
            store.clone(),
            64,
        );

        let summary = pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap();

        assert_eq!(summary.documents_processed, 0);
        assert_eq!(summary.documents_failed, 0);
        assert_eq!(summary.total_chunks, 0);
        // The collection still gets created, matching a fixed-name workflow.
        assert_eq!(store.ensured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn embedding_runs_in_batches() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["big.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 150, fail_on: None }),
            embedder.clone(),
            store,
            64,
        );

        let summary = pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap();

        assert_eq!(summary.total_chunks, 150);
        assert_eq!(embedder.batch_sizes.lock().unwrap().as_slice(), &[64, 64, 22]);
    }

    #[tokio::test]
    async fn inserted_text_is_the_rendered_chunk() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["a.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: None }),
            embedder,
            store.clone(),
            64,
        );

        pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap();

        let inserted = store.inserted.lock().unwrap();
        let text = &inserted[0].1[0].text;
        assert!(
            text.starts_with("a.pdf section 0\n"),
            "chunk text must begin with its heading line, got: {text:?}"
        );
    }

    #[tokio::test]
    async fn semantic_without_layout_client_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["a.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(None, embedder, store, 64);

        let err = pipeline
            .ingest_directory(dir.path(), Some("papers"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SemanticUnavailable));
    }

    #[tokio::test]
    async fn fallback_counts_unparseable_pdf_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["broken.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(None, embedder, store, 64);

        let summary = pipeline
            .ingest_directory(dir.path(), Some("papers"), false)
            .await
            .unwrap();
        assert_eq!(summary.documents_processed, 0);
        assert_eq!(summary.documents_failed, 1);
    }

    #[tokio::test]
    async fn single_file_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["bad.pdf"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: Some("bad") }),
            embedder,
            store,
            64,
        );

        let err = pipeline
            .ingest_file(&dir.path().join("bad.pdf"), Some("papers"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Segment(_)));
    }

    #[tokio::test]
    async fn single_file_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        write_files(&dir, &["notes.txt", "REPORT.PDF"]);

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: None }),
            embedder,
            store.clone(),
            64,
        );

        let err = pipeline
            .ingest_file(&dir.path().join("notes.txt"), Some("papers"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFile(_)));
        // Rejected before the collection is touched.
        assert!(store.ensured.lock().unwrap().is_empty());

        // The extension check is case-insensitive, like the directory filter.
        let summary = pipeline
            .ingest_file(&dir.path().join("REPORT.PDF"), Some("papers"), true)
            .await
            .unwrap();
        assert_eq!(summary.documents_processed, 1);
    }

    #[tokio::test]
    async fn invalid_collection_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let embedder = Arc::new(FakeEmbedder::new());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(
            Some(FakeSegments { per_file: 1, fail_on: None }),
            embedder,
            store,
            64,
        );

        let err = pipeline
            .ingest_directory(dir.path(), Some("1-bad-name"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidCollection(_)));
    }

    #[test]
    fn random_names_are_always_valid() {
        for _ in 0..200 {
            let name = random_collection_name();
            assert!(name.starts_with('a'));
            assert!(name.len() >= 6 && name.len() <= 33, "bad length: {name}");
            assert!(is_valid_collection_name(&name), "invalid: {name}");
        }
    }

    #[test]
    fn collection_name_validation() {
        assert!(is_valid_collection_name("papers"));
        assert!(is_valid_collection_name("_private"));
        assert!(is_valid_collection_name("a2024_runs"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("1papers"));
        assert!(!is_valid_collection_name("my-papers"));
        assert!(!is_valid_collection_name("pa pers"));
        assert!(!is_valid_collection_name(&"x".repeat(256)));
    }
}
