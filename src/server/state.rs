//! Shared application state

use std::sync::Arc;

use crate::chat::ChatPipeline;
use crate::config::RagConfig;
use crate::conversation::ConversationStore;
use crate::error::Result;
use crate::ingestion::{DocumentLoader, IngestionPipeline, PdfLoader};
use crate::providers::{
    EmbeddingProvider, GeminiClient, GeminiEmbedder, GeminiLlm, LlmProvider, PineconeIndex,
    VectorIndexProvider,
};

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    ingestion: IngestionPipeline,
    chat: ChatPipeline,
    conversations: Arc<ConversationStore>,
}

impl AppState {
    /// Build state with the production providers
    pub fn new(config: RagConfig) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
        let embedder = Arc::new(GeminiEmbedder::from_client(Arc::clone(&gemini)));
        let llm = Arc::new(GeminiLlm::from_client(gemini));
        let index = Arc::new(PineconeIndex::new(&config.pinecone)?);

        Ok(Self::with_providers(
            config,
            Arc::new(PdfLoader::new()),
            embedder,
            llm,
            index,
        ))
    }

    /// Build state with explicit providers
    pub fn with_providers(
        config: RagConfig,
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndexProvider>,
    ) -> Self {
        tracing::info!(
            embedder = embedder.name(),
            llm = llm.name(),
            index = index.name(),
            "Initializing providers"
        );

        let conversations = Arc::new(ConversationStore::new());
        let ingestion = IngestionPipeline::new(
            loader,
            Arc::clone(&embedder),
            Arc::clone(&index),
            &config.chunking,
            &config.ingestion,
        );
        let chat = ChatPipeline::new(
            embedder,
            llm,
            index,
            &config.retrieval,
            Arc::clone(&conversations),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                ingestion,
                chat,
                conversations,
            }),
        }
    }

    /// Service configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Document ingestion pipeline
    pub fn ingestion(&self) -> &IngestionPipeline {
        &self.inner.ingestion
    }

    /// Conversational query pipeline
    pub fn chat(&self) -> &ChatPipeline {
        &self.inner.chat
    }

    /// Conversation store
    pub fn conversations(&self) -> &ConversationStore {
        &self.inner.conversations
    }
}
