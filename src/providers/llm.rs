//! Language-model provider trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Turn;

/// Trait for LLM text generation over an ordered conversation.
///
/// The system instruction constrains the model for the task at hand: query
/// rewriting or context-grounded answering.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text given the ordered turns and a system instruction
    async fn generate(&self, turns: &[Turn], system_instruction: &str) -> Result<String>;

    /// The model being used
    fn model(&self) -> &str;

    /// Provider name for logging
    fn name(&self) -> &str;
}
