//! Configuration for the RAG service
//!
//! All options load from environment variables with sensible defaults; only
//! the external-service credentials are required.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Ingestion configuration
    pub ingestion: IngestionConfig,
    /// Embedding/LLM service configuration
    pub gemini: GeminiConfig,
    /// Vector index configuration
    pub pinecone: PineconeConfig,
}

impl RagConfig {
    /// Load configuration from the environment.
    ///
    /// Fails when a required credential is missing or a numeric option does
    /// not parse.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_parse("PORT", 5000)?,
                max_upload_size: env_parse("MAX_UPLOAD_SIZE", 50 * 1024 * 1024)?,
            },
            chunking: ChunkingConfig {
                chunk_size: env_parse("CHUNK_SIZE", 1000)?,
                chunk_overlap: env_parse("CHUNK_OVERLAP", 200)?,
            },
            retrieval: RetrievalConfig {
                top_k: env_parse("RETRIEVAL_TOP_K", 10)?,
                max_context_chars: env_parse_opt("MAX_CONTEXT_CHARS")?,
            },
            ingestion: IngestionConfig {
                embed_concurrency: env_parse("EMBED_CONCURRENCY", 5)?,
                embed_batch_size: env_parse("EMBED_BATCH_SIZE", 16)?,
            },
            gemini: GeminiConfig {
                api_key: env_required("GEMINI_API_KEY")?,
                embed_model: env_or("GEMINI_EMBED_MODEL", "text-embedding-004"),
                generate_model: env_or("GEMINI_GENERATE_MODEL", "gemini-2.0-flash"),
                timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 30)?,
                ..GeminiConfig::default()
            },
            pinecone: PineconeConfig {
                api_key: env_required("PINECONE_API_KEY")?,
                index_host: env_required("PINECONE_INDEX_HOST")?,
                timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 30)?,
                ..PineconeConfig::default()
            },
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of nearest chunks to retrieve per query
    pub top_k: usize,
    /// Optional cap on assembled context length, cut at a match boundary
    pub max_context_chars: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_context_chars: None,
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum concurrent embedding batches per document
    pub embed_concurrency: usize,
    /// Number of chunk texts per embedding batch call
    pub embed_batch_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            embed_concurrency: 5,
            embed_batch_size: 16,
        }
    }
}

/// Generative Language API configuration (embeddings + generation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// API base URL
    pub api_base: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embed_model: "text-embedding-004".to_string(),
            generate_model: "gemini-2.0-flash".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Pinecone vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// API key
    pub api_key: String,
    /// Index data-plane host, e.g. `https://my-index-abc123.svc.pinecone.io`
    pub index_host: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_host: String::new(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::Config(format!("{key} is not set")))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

fn env_parse_opt<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
