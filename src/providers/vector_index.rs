//! Vector index provider trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, RetrievedMatch};

/// Trait for vector storage and similarity search.
///
/// The index owns the on-disk/wire format; this crate only upserts embedded
/// chunks and queries by vector. The similarity metric is whatever the index
/// was created with; scores are passed through unchanged.
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Upsert embedded chunks with their metadata
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return the `top_k` nearest matches for a query vector.
    ///
    /// An empty result set is valid when the index holds no chunks.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedMatch>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
