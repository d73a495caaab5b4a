//! Document ingestion: load, chunk, embed, and index uploaded PDFs

pub mod chunker;
pub mod loader;

use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use crate::config::{ChunkingConfig, IngestionConfig};
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndexProvider};

pub use chunker::RecursiveChunker;
pub use loader::{DocumentLoader, PdfLoader};

/// End-to-end ingestion pipeline.
///
/// Each batch of chunks is embedded and upserted independently under a
/// bounded concurrency limit. A failure in any batch fails the whole
/// ingestion.
pub struct IngestionPipeline {
    loader: Arc<dyn DocumentLoader>,
    chunker: RecursiveChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndexProvider>,
    concurrency: usize,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        chunking: &ChunkingConfig,
        ingestion: &IngestionConfig,
    ) -> Self {
        Self {
            loader,
            chunker: RecursiveChunker::new(chunking.chunk_size, chunking.chunk_overlap),
            embedder,
            index,
            concurrency: ingestion.embed_concurrency.max(1),
            batch_size: ingestion.embed_batch_size.max(1),
        }
    }

    /// Ingest one document: extract, chunk, embed, and upsert.
    ///
    /// Returns the number of chunks indexed.
    pub async fn ingest(&self, path: &Path, source: &str) -> Result<usize> {
        let segments = {
            let loader = Arc::clone(&self.loader);
            let path = path.to_path_buf();
            let filename = source.to_string();
            tokio::task::spawn_blocking(move || loader.load(&path))
                .await
                .map_err(|e| Error::Extraction {
                    filename,
                    message: format!("Extraction task failed: {e}"),
                })??
        };

        let chunks = self.chunker.split(source, &segments);
        if chunks.is_empty() {
            return Err(Error::Extraction {
                filename: source.to_string(),
                message: "Document produced no chunks".to_string(),
            });
        }

        let total = chunks.len();
        tracing::info!(source, chunks = total, "Embedding and indexing document");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let batches = join_all(chunks.chunks(self.batch_size).map(|batch| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| Error::embedding(format!("Semaphore closed: {e}")))?;

                let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
                let embeddings = self.embedder.embed_batch(&texts).await?;

                if embeddings.len() != batch.len() {
                    return Err(Error::embedding(format!(
                        "Embedder returned {} vectors for {} chunks",
                        embeddings.len(),
                        batch.len()
                    )));
                }

                let embedded: Vec<_> = batch
                    .iter()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| chunk.clone().with_embedding(embedding))
                    .collect();

                self.index.upsert(&embedded).await
            }
        }))
        .await;

        for result in batches {
            result?;
        }

        tracing::info!(source, chunks = total, "Document indexed");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::types::{Chunk, RetrievedMatch, TextSegment};

    struct FixedLoader {
        segments: Vec<TextSegment>,
    }

    impl DocumentLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<Vec<TextSegment>> {
            Ok(self.segments.clone())
        }
    }

    struct FailingLoader;

    impl DocumentLoader for FailingLoader {
        fn load(&self, _path: &Path) -> Result<Vec<TextSegment>> {
            Err(Error::Extraction {
                filename: "bad.pdf".to_string(),
                message: "No extractable text found in PDF".to_string(),
            })
        }
    }

    struct CountingEmbedder {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 4])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserted: Mutex<Vec<Chunk>>,
    }

    #[async_trait]
    impl VectorIndexProvider for RecordingIndex {
        async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
            self.upserted
                .lock()
                .unwrap()
                .extend(chunks.iter().cloned());
            Ok(())
        }

        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<RetrievedMatch>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn pipeline_with(
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndexProvider>,
        concurrency: usize,
        batch_size: usize,
    ) -> IngestionPipeline {
        IngestionPipeline::new(
            loader,
            embedder,
            index,
            &ChunkingConfig {
                chunk_size: 40,
                chunk_overlap: 8,
            },
            &IngestionConfig {
                embed_concurrency: concurrency,
                embed_batch_size: batch_size,
            },
        )
    }

    #[tokio::test]
    async fn ingest_embeds_and_upserts_every_chunk() {
        let index = Arc::new(RecordingIndex::default());
        let pipeline = pipeline_with(
            Arc::new(FixedLoader {
                segments: vec![TextSegment::page(
                    1,
                    "Binary heaps support insert in logarithmic time. \
                     Quicksort partitions around a pivot element.",
                )],
            }),
            Arc::new(CountingEmbedder::new()),
            Arc::clone(&index) as Arc<dyn VectorIndexProvider>,
            2,
            2,
        );

        let count = pipeline
            .ingest(Path::new("/tmp/upload.pdf"), "dsa.pdf")
            .await
            .unwrap();

        let upserted = index.upserted.lock().unwrap();
        assert_eq!(count, upserted.len());
        assert!(count > 1);
        for chunk in upserted.iter() {
            assert!(!chunk.embedding.is_empty());
            assert_eq!(chunk.metadata.source, "dsa.pdf");
        }
    }

    #[tokio::test]
    async fn concurrent_batches_stay_under_the_limit() {
        let embedder = Arc::new(CountingEmbedder::new());
        let pipeline = pipeline_with(
            Arc::new(FixedLoader {
                segments: vec![TextSegment::page(1, &"word ".repeat(200))],
            }),
            Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>,
            Arc::new(RecordingIndex::default()),
            3,
            1,
        );

        pipeline
            .ingest(Path::new("/tmp/upload.pdf"), "long.pdf")
            .await
            .unwrap();

        assert!(embedder.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert!(embedder.max_in_flight.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn extraction_failure_propagates() {
        let pipeline = pipeline_with(
            Arc::new(FailingLoader),
            Arc::new(CountingEmbedder::new()),
            Arc::new(RecordingIndex::default()),
            2,
            4,
        );

        let err = pipeline
            .ingest(Path::new("/tmp/upload.pdf"), "bad.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }
}
