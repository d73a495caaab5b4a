//! Core data types shared by the ingestion and query pipelines

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A question asked by the user
    User,
    /// An answer produced by the language model
    Model,
}

impl Role {
    /// Wire name used by the language-model API
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One conversation turn. Immutable once appended to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A raw text segment produced by the document loader, typically one page
#[derive(Debug, Clone)]
pub struct TextSegment {
    /// Extracted text
    pub text: String,
    /// Page number (1-indexed) when the loader knows it
    pub page: Option<u32>,
}

impl TextSegment {
    /// Create a segment for a known page
    pub fn page(page: u32, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: Some(page),
        }
    }
}

/// Source information carried with every chunk into the vector index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Original filename as uploaded
    pub source: String,
    /// Page number (1-indexed) within the source document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Byte offset of the chunk start within its segment
    pub char_start: usize,
    /// Byte offset one past the chunk end within its segment
    pub char_end: usize,
}

/// A bounded slice of document text, the unit of embedding and retrieval.
/// Immutable once created; the embedding is attached exactly once before
/// upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content
    pub text: String,
    /// Embedding vector, empty until the embedding stage fills it
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
    /// Source information
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(text: String, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            embedding: Vec::new(),
            metadata,
        }
    }

    /// Attach the embedding vector
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// A similarity match returned by the vector index for one query
#[derive(Debug, Clone)]
pub struct RetrievedMatch {
    /// Chunk text stored alongside the vector
    pub text: String,
    /// Similarity score, higher is more similar
    pub score: f32,
    /// Metadata stored with the vector
    pub metadata: serde_json::Value,
}
