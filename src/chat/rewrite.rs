//! Follow-up question rewriting against conversation history

use std::sync::Arc;

use crate::conversation::Conversation;
use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::Turn;

/// System instruction for the rewriting call
pub const REWRITE_INSTRUCTION: &str = "You are a query rewriting expert. Based on the provided chat history, rephrase the \"Follow Up user Question\" into a complete, standalone question that can be understood without the chat history. Only output the rewritten question and nothing else.";

/// Rewrites a follow-up question into a standalone one using the history.
///
/// The history itself is never modified; the incoming question is shown to
/// the model as a candidate final turn only.
pub struct QueryRewriter {
    llm: Arc<dyn LlmProvider>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produce the standalone form of `question` given the conversation so far
    pub async fn rewrite(&self, question: &str, history: &Conversation) -> Result<String> {
        let turns = history.with_candidate(Turn::user(question));
        let rewritten = self.llm.generate(&turns, REWRITE_INSTRUCTION).await?;
        let rewritten = rewritten.trim();

        tracing::debug!(original = question, standalone = rewritten, "Rewrote query");
        Ok(rewritten.to_string())
    }
}
