//! pdf-chat: conversational RAG service over PDF documents
//!
//! This crate ingests PDFs into a remote vector index and answers
//! natural-language questions about them with retrieval-augmented generation.
//! Follow-up questions are rewritten into standalone queries against the
//! conversation history, so multi-turn sessions stay grounded in the
//! originally asked questions.

pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{Chunk, ChunkMetadata, RetrievedMatch, Role, TextSegment, Turn};
