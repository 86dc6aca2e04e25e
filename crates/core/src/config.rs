use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub docintel: DocIntelConfig,
    pub embedding: EmbeddingConfig,
    pub milvus: MilvusConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub chunking: ChunkingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            docintel: DocIntelConfig::from_env(),
            embedding: EmbeddingConfig::from_env(),
            milvus: MilvusConfig::from_env(),
            llm: LlmConfig::from_env(),
            ollama: OllamaConfig::from_env(),
            chunking: ChunkingConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:    host={}, port={}", self.server.host, self.server.port);
        tracing::info!(
            "  docintel:  endpoint={}, model={}",
            self.docintel.endpoint.as_deref().unwrap_or("(none)"),
            self.docintel.model
        );
        tracing::info!(
            "  embedding: provider={}, model={}, dimensions={}",
            self.embedding.provider,
            self.embedding.model,
            self.embedding.dimensions
        );
        tracing::info!(
            "  milvus:    url={}, collection={}",
            self.milvus.url,
            self.milvus.collection.as_deref().unwrap_or("(random per ingest)")
        );
        tracing::info!("  llm:       provider={}", self.llm.provider);
        tracing::info!("  ollama:    url={}", self.ollama.url);
        tracing::info!(
            "  chunking:  band={}..{}, fallback={}ch/{}overlap",
            self.chunking.min_chars,
            self.chunking.max_chars,
            self.chunking.fallback_chunk_size,
            self.chunking.fallback_chunk_overlap
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "server": { "host": self.server.host, "port": self.server.port },
            "docintel": {
                "endpoint": self.docintel.endpoint,
                "model": self.docintel.model,
                "configured": self.docintel.is_configured(),
            },
            "embedding": {
                "provider": self.embedding.provider,
                "model": self.embedding.model,
                "dimensions": self.embedding.dimensions,
                "configured": self.embedding.is_configured(),
            },
            "milvus": {
                "url": self.milvus.url,
                "collection": self.milvus.collection,
            },
            "llm": {
                "provider": self.llm.provider,
                "configured": self.llm.is_configured(),
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
            "chunking": {
                "min_chars": self.chunking.min_chars,
                "max_chars": self.chunking.max_chars,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 7777),
            cors_origin: env_or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Azure Document Intelligence ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocIntelConfig {
    pub endpoint: Option<String>,
    pub key: Option<String>,
    pub model: String,
    pub api_version: String,
    /// Delay between result polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up on an analysis after this many polls.
    pub max_polls: u32,
}

impl DocIntelConfig {
    fn from_env() -> Self {
        Self {
            endpoint: env_opt("AZURE_DOC_ENDPOINT"),
            key: env_opt("AZURE_DOC_KEY"),
            model: env_or("AZURE_DOC_MODEL", "prebuilt-layout"),
            api_version: env_or("AZURE_DOC_API_VERSION", "2024-11-30"),
            poll_interval_ms: env_u64("AZURE_DOC_POLL_INTERVAL_MS", 2000),
            max_polls: env_u32("AZURE_DOC_MAX_POLLS", 60),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.key.is_some()
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "openai", "ollama"
    pub provider: String,
    pub model: String,
    pub dimensions: u32,
    pub batch_size: u32,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl EmbeddingConfig {
    fn from_env() -> Self {
        Self {
            provider: env_or("EMBEDDING_PROVIDER", "openai"),
            model: env_or("EMBEDDING_MODEL", "text-embedding-3-large"),
            dimensions: env_u32("EMBEDDING_DIMENSIONS", 3072),
            batch_size: env_u32("EMBEDDING_BATCH_SIZE", 64),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_base_url: env_opt("OPENAI_BASE_URL"),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Milvus ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilvusConfig {
    pub url: String,
    pub token: Option<String>,
    /// Fixed collection name; when unset each ingest generates a random one.
    pub collection: Option<String>,
}

impl MilvusConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("MILVUS_URL", "http://localhost:19530"),
            token: env_opt("MILVUS_TOKEN"),
            collection: env_opt("MILVUS_COLLECTION"),
        }
    }
}

// ── LLM (Gemini / OpenAI) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai", "ollama"
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env() -> Self {
        Self {
            provider: env_or("LLM_PROVIDER", "gemini"),
            gemini_api_key: env_opt("GEMINI_KEY"),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
            openai_base_url: env_opt("OPENAI_BASE_URL"),
            temperature: env_or("LLM_TEMPERATURE", "0.2").parse().unwrap_or(0.2),
            max_tokens: env_u32("LLM_MAX_TOKENS", 4096),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "gemini" => self.gemini_api_key.is_some(),
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub embedding_model: String,
}

impl OllamaConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("OLLAMA_URL", "http://localhost:11434"),
            model: env_or("OLLAMA_MODEL", "llama3.2"),
            embedding_model: env_or("OLLAMA_EMBEDDING_MODEL", "nomic-embed-text"),
        }
    }
}

// ── Chunking / retrieval tuning ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Stop merging once a chunk reaches this many characters.
    pub min_chars: usize,
    /// Never merge past this many characters.
    pub max_chars: usize,
    /// Fallback splitter target size (non-semantic path).
    pub fallback_chunk_size: usize,
    /// Fallback splitter overlap between consecutive chunks.
    pub fallback_chunk_overlap: usize,
    /// How many hits to request from the vector store.
    pub search_limit: usize,
    /// How many of those hits feed the answer prompt.
    pub context_top_k: usize,
}

impl ChunkingConfig {
    fn from_env() -> Self {
        Self {
            min_chars: env_usize("CHUNK_MIN_CHARS", 500),
            max_chars: env_usize("CHUNK_MAX_CHARS", 1000),
            fallback_chunk_size: env_usize("FALLBACK_CHUNK_SIZE", 1000),
            fallback_chunk_overlap: env_usize("FALLBACK_CHUNK_OVERLAP", 300),
            search_limit: env_usize("SEARCH_LIMIT", 10),
            context_top_k: env_usize("CONTEXT_TOP_K", 5),
        }
    }
}
