//! Pinecone data-plane client for upsert and similarity queries, with retry

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::PineconeConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, RetrievedMatch};

use super::vector_index::VectorIndexProvider;

/// HTTP client for one Pinecone index
pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
}

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<UpsertVector>,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: serde_json::Value,
}

#[derive(Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    score: f32,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl PineconeIndex {
    /// Create a new index client
    pub fn new(config: &PineconeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Pinecone request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.config.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::index("Unknown error")))
    }

    fn request_error(&self, err: reqwest::Error, stage: &'static str) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout {
                service: "pinecone",
                budget_secs: self.config.timeout_secs,
            }
        } else {
            Error::index(format!("{stage} request failed: {err}"))
        }
    }

    /// Metadata stored alongside each vector: the chunk text plus its source
    fn vector_metadata(chunk: &Chunk) -> serde_json::Value {
        let mut metadata = serde_json::json!({
            "text": chunk.text,
            "source": chunk.metadata.source,
            "chunk_index": chunk.metadata.chunk_index,
        });
        if let Some(page) = chunk.metadata.page {
            metadata["page"] = serde_json::json!(page);
        }
        metadata
    }
}

#[async_trait]
impl VectorIndexProvider for PineconeIndex {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let url = format!("{}/vectors/upsert", self.config.index_host);

        self.retry_request(|| {
            let url = url.clone();

            async move {
                let request = UpsertRequest {
                    vectors: chunks
                        .iter()
                        .map(|chunk| UpsertVector {
                            id: chunk.id.to_string(),
                            values: chunk.embedding.clone(),
                            metadata: Self::vector_metadata(chunk),
                        })
                        .collect(),
                };

                let response = self
                    .client
                    .post(&url)
                    .header("Api-Key", &self.config.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e, "Upsert"))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::index(format!(
                        "Upsert failed: HTTP {status} - {body}"
                    )));
                }

                Ok(())
            }
        })
        .await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievedMatch>> {
        let url = format!("{}/query", self.config.index_host);

        self.retry_request(|| {
            let url = url.clone();

            async move {
                let request = QueryRequest {
                    vector: vector.to_vec(),
                    top_k,
                    include_metadata: true,
                };

                let response = self
                    .client
                    .post(&url)
                    .header("Api-Key", &self.config.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e, "Query"))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::index(format!(
                        "Query failed: HTTP {status} - {body}"
                    )));
                }

                let query_response: QueryResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::index(format!("Failed to parse query response: {e}")))?;

                Ok(query_response
                    .matches
                    .into_iter()
                    .map(|m| RetrievedMatch {
                        text: m
                            .metadata
                            .get("text")
                            .and_then(|t| t.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        score: m.score,
                        metadata: m.metadata,
                    })
                    .collect())
            }
        })
        .await
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
