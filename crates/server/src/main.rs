mod api;
mod memory;
mod pipeline;
mod router;
mod state;
mod vector_store;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use paperchat_core::config::Config;
use paperchat_ingest::document::layout::{AzureSegmentSource, DocIntelClient};
use paperchat_ingest::{create_embedder, Embedder, SegmentSource};
use paperchat_llm::AnswerSynthesizer;

use crate::memory::ConversationMemory;
use crate::pipeline::IngestPipeline;
use crate::state::AppState;
use crate::vector_store::MilvusStore;

fn load_config() -> Config {
    paperchat_core::config::load_dotenv();
    Config::from_env()
}

/// Layout analysis client, when Document Intelligence credentials are set.
fn build_segment_source(config: &Config) -> Option<Arc<dyn SegmentSource>> {
    if !config.docintel.is_configured() {
        return None;
    }
    let client = DocIntelClient::new(
        config.docintel.endpoint.clone()?,
        config.docintel.key.clone()?,
        config.docintel.model.clone(),
        config.docintel.api_version.clone(),
        config.docintel.poll_interval_ms,
        config.docintel.max_polls,
    );
    Some(Arc::new(AzureSegmentSource::new(client)))
}

/// Wire up every integration the environment provides. Missing credentials
/// disable the dependent endpoints instead of failing startup.
fn build_state(config: Config) -> Arc<AppState> {
    let store = Arc::new(MilvusStore::from_config(&config.milvus));

    let segment_source = build_segment_source(&config);
    if segment_source.is_some() {
        info!("Document Intelligence configured, semantic chunking available");
    } else {
        warn!("Document Intelligence not configured, semantic chunking disabled");
    }

    let embedder: Option<Arc<dyn Embedder>> =
        match create_embedder(&config.embedding, &config.ollama) {
            Ok(embedder) => {
                info!(
                    "Embedding provider '{}' ready ({} dims)",
                    config.embedding.provider,
                    embedder.dimensions()
                );
                Some(Arc::from(embedder))
            }
            Err(e) => {
                warn!("Embedding provider unavailable ({e}), /ingest and /ask are disabled");
                None
            }
        };

    let synthesizer = match AnswerSynthesizer::from_config(&config.llm, &config.ollama) {
        Ok(synthesizer) => {
            info!("Answer model '{}' ready", config.llm.provider);
            Some(Arc::new(synthesizer))
        }
        Err(e) => {
            warn!("Answer model unavailable ({e}), POST /ask is disabled");
            None
        }
    };

    let active_collection = config.milvus.collection.clone();
    if let Some(name) = &active_collection {
        info!("Serving configured collection '{name}'");
    }

    Arc::new(AppState {
        config,
        segment_source,
        embedder,
        store,
        synthesizer,
        memory: ConversationMemory::new(),
        active_collection: RwLock::new(active_collection),
    })
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();
    let port = config.server.port;
    let addr = format!("{}:{}", config.server.host, port);

    let state = build_state(config);
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{port}");
    info!("API docs at http://localhost:{port}/docs");
    axum::serve(listener, app).await?;

    Ok(())
}

/// CLI ingest: same pipeline as POST /ingest, without running the server.
async fn ingest_dir(config: Config, dir: &Path) -> anyhow::Result<()> {
    let state = build_state(config);
    let embedder = state
        .embedder
        .clone()
        .ok_or_else(|| anyhow::anyhow!("embedding provider not configured"))?;

    let semantic = state.segment_source.is_some();
    if !semantic {
        info!("Layout analysis unavailable, using local extraction fallback");
    }

    let pipeline = IngestPipeline::new(
        state.segment_source.clone(),
        embedder,
        state.store.clone(),
        state.config.chunking.clone(),
        state.config.embedding.batch_size as usize,
        state.config.milvus.collection.clone(),
    );
    let summary = pipeline.ingest_directory(dir, None, semantic).await?;

    info!(
        "Ingested {} documents ({} failed), {} chunks into '{}'",
        summary.documents_processed,
        summary.documents_failed,
        summary.total_chunks,
        summary.collection
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = load_config();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("ingest") => {
            let dir = args.get(2).expect("Usage: server ingest <directory>");
            ingest_dir(config, Path::new(dir)).await?;
        }
        Some("serve") | None => {
            serve(config).await?;
        }
        _ => {
            println!("paperchat v0.1.0");
            println!("Usage: server <command>");
            println!("  serve               Start HTTP server (default)");
            println!("  ingest <directory>  Ingest every PDF in a directory");
        }
    }

    Ok(())
}
