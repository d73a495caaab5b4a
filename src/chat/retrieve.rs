//! Similarity retrieval for a standalone question

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::{EmbeddingProvider, VectorIndexProvider};
use crate::types::RetrievedMatch;

/// Embeds a standalone question and queries the vector index
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    /// Return up to `top_k` matches, most similar first
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedMatch>> {
        let vector = self.embedder.embed(question).await?;
        let mut matches = self.index.query(&vector, self.top_k).await?;

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        tracing::debug!(question, matches = matches.len(), "Retrieved context");
        Ok(matches)
    }
}
