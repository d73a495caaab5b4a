//! Generative Language API client for embeddings and generation, with retry

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use crate::types::Turn;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// HTTP client for the Generative Language API with automatic retry
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

impl Content {
    fn from_turn(turn: &Turn) -> Self {
        Self {
            role: Some(turn.role.as_str().to_string()),
            parts: vec![Part {
                text: turn.text.clone(),
            }],
        }
    }

    fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Serialize)]
struct EmbedRequest {
    content: Content,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<BatchEmbedEntry>,
}

#[derive(Serialize)]
struct BatchEmbedEntry {
    model: String,
    content: Content,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(config: &GeminiConfig) -> Result<Self> {
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

    /// Retry a request with exponential backoff
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
                            "Gemini request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.config.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::generation("Unknown error")))
    }

    fn request_error(
        &self,
        err: reqwest::Error,
        stage: &'static str,
        wrap: fn(String) -> Error,
    ) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout {
                service: "gemini",
                budget_secs: self.config.timeout_secs,
            }
        } else {
            wrap(format!("{stage} request failed: {err}"))
        }
    }

    /// Generate an embedding for one text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.config.api_base, self.config.embed_model, self.config.api_key
        );
        let text = text.to_string();

        self.retry_request(|| {
            let url = url.clone();
            let text = text.clone();

            async move {
                let request = EmbedRequest {
                    content: Content::system(&text),
                };

                let response = self
                    .client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e, "Embedding", Error::Embedding))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let embed_response: EmbedResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {e}")))?;

                Ok(embed_response.embedding.values)
            }
        })
        .await
    }

    /// Generate embeddings for a batch of texts in one call
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.config.api_base, self.config.embed_model, self.config.api_key
        );
        let model = format!("models/{}", self.config.embed_model);

        self.retry_request(|| {
            let url = url.clone();
            let model = model.clone();

            async move {
                let request = BatchEmbedRequest {
                    requests: texts
                        .iter()
                        .map(|text| BatchEmbedEntry {
                            model: model.clone(),
                            content: Content::system(text),
                        })
                        .collect(),
                };

                let response = self
                    .client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e, "Batch embedding", Error::Embedding))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Batch embedding failed: HTTP {}",
                        response.status()
                    )));
                }

                let batch_response: BatchEmbedResponse = response.json().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse batch embedding response: {e}"))
                })?;

                if batch_response.embeddings.len() != texts.len() {
                    return Err(Error::embedding(format!(
                        "Batch embedding returned {} vectors for {} texts",
                        batch_response.embeddings.len(),
                        texts.len()
                    )));
                }

                Ok(batch_response
                    .embeddings
                    .into_iter()
                    .map(|e| e.values)
                    .collect())
            }
        })
        .await
    }

    /// Generate text from the ordered turns under a system instruction
    pub async fn generate(&self, turns: &[Turn], system_instruction: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_base, self.config.generate_model, self.config.api_key
        );

        tracing::debug!(
            "Generating with model {} over {} turns",
            self.config.generate_model,
            turns.len()
        );

        self.retry_request(|| {
            let url = url.clone();

            async move {
                let request = GenerateRequest {
                    contents: turns.iter().map(Content::from_turn).collect(),
                    system_instruction: Content::system(system_instruction),
                };

                let response = self
                    .client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| self.request_error(e, "Generation", Error::Generation))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::generation(format!(
                        "Generation failed: HTTP {status} - {body}"
                    )));
                }

                let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                    Error::generation(format!("Failed to parse generation response: {e}"))
                })?;

                let text = generate_response
                    .candidates
                    .into_iter()
                    .next()
                    .map(|c| {
                        c.content
                            .parts
                            .into_iter()
                            .map(|p| p.text)
                            .collect::<String>()
                    })
                    .ok_or_else(|| Error::generation("Generation returned no candidates"))?;

                Ok(text)
            }
        })
        .await
    }
}

/// Embedding provider backed by a shared [`GeminiClient`]
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
}

impl GeminiEmbedder {
    /// Create from an existing client
    pub fn from_client(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// LLM provider backed by a shared [`GeminiClient`]
pub struct GeminiLlm {
    client: Arc<GeminiClient>,
}

impl GeminiLlm {
    /// Create from an existing client
    pub fn from_client(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    async fn generate(&self, turns: &[Turn], system_instruction: &str) -> Result<String> {
        self.client.generate(turns, system_instruction).await
    }

    fn model(&self) -> &str {
        &self.client.config.generate_model
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
