//! Provider abstractions for the external embedding, language-model, and
//! vector-index services
//!
//! Everything remote sits behind a trait so the pipelines can be exercised
//! against in-process fakes in tests.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod pinecone;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder, GeminiLlm};
pub use llm::LlmProvider;
pub use pinecone::PineconeIndex;
pub use vector_index::VectorIndexProvider;
