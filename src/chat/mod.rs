//! Conversational query pipeline: rewrite, retrieve, assemble, answer

pub mod answer;
pub mod context;
pub mod retrieve;
pub mod rewrite;

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::conversation::ConversationStore;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorIndexProvider};

pub use answer::{AnswerGenerator, FALLBACK_ANSWER};
pub use context::{ContextAssembler, CONTEXT_DELIMITER};
pub use retrieve::Retriever;
pub use rewrite::{QueryRewriter, REWRITE_INSTRUCTION};

/// Result of one conversational query
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Generated answer
    pub answer: String,
    /// Context block the answer was grounded in
    pub context: String,
}

/// Orchestrates one conversational query end to end.
///
/// The conversation lock is taken before rewriting and held until the answer
/// is recorded, so concurrent questions on the same conversation serialize
/// and each sees a consistent history.
pub struct ChatPipeline {
    rewriter: QueryRewriter,
    retriever: Retriever,
    assembler: ContextAssembler,
    answerer: AnswerGenerator,
    conversations: Arc<ConversationStore>,
}

impl ChatPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndexProvider>,
        retrieval: &RetrievalConfig,
        conversations: Arc<ConversationStore>,
    ) -> Self {
        Self {
            rewriter: QueryRewriter::new(Arc::clone(&llm)),
            retriever: Retriever::new(embedder, index, retrieval.top_k),
            assembler: ContextAssembler::new(retrieval.max_context_chars),
            answerer: AnswerGenerator::new(llm),
            conversations,
        }
    }

    /// Answer `question` within the conversation identified by
    /// `conversation_id`, updating its history.
    pub async fn query(&self, question: &str, conversation_id: &str) -> Result<ChatOutcome> {
        let conversation = self.conversations.get_or_create(conversation_id);
        let mut history = conversation.lock().await;

        let standalone = self.rewriter.rewrite(question, &history).await?;
        let matches = self.retriever.retrieve(&standalone).await?;
        let context = self.assembler.assemble(&matches);

        if matches.is_empty() {
            tracing::debug!(conversation_id, "No matches retrieved for query");
        }

        let answer = self.answerer.answer(question, &context, &mut history).await?;

        tracing::info!(
            conversation_id,
            turns = history.len(),
            "Answered conversational query"
        );

        Ok(ChatOutcome { answer, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::types::{Chunk, RetrievedMatch, Role, Turn};

    struct StaticEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StaticEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.1, 0.2])
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct StaticIndex {
        matches: Vec<RetrievedMatch>,
    }

    #[async_trait]
    impl VectorIndexProvider for StaticIndex {
        async fn upsert(&self, _chunks: &[Chunk]) -> Result<()> {
            Ok(())
        }

        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<RetrievedMatch>> {
            Ok(self.matches.clone())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    /// Echoes the final turn so each query gets a distinct answer, and
    /// records every instruction it was called with.
    struct EchoLlm {
        instructions: Mutex<Vec<String>>,
    }

    impl EchoLlm {
        fn new() -> Self {
            Self {
                instructions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, turns: &[Turn], system_instruction: &str) -> Result<String> {
            self.instructions
                .lock()
                .unwrap()
                .push(system_instruction.to_string());
            tokio::task::yield_now().await;
            let last = turns.last().map(|t| t.text.clone()).unwrap_or_default();
            Ok(format!("echo: {last}"))
        }

        fn model(&self) -> &str {
            "echo"
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn pipeline(matches: Vec<RetrievedMatch>, conversations: Arc<ConversationStore>) -> ChatPipeline {
        ChatPipeline::new(
            Arc::new(StaticEmbedder),
            Arc::new(EchoLlm::new()),
            Arc::new(StaticIndex { matches }),
            &RetrievalConfig {
                top_k: 10,
                max_context_chars: None,
            },
            conversations,
        )
    }

    fn some_matches() -> Vec<RetrievedMatch> {
        vec![
            RetrievedMatch {
                text: "heap insert is O(log n)".to_string(),
                score: 0.9,
                metadata: serde_json::Value::Null,
            },
            RetrievedMatch {
                text: "quicksort averages O(n log n)".to_string(),
                score: 0.7,
                metadata: serde_json::Value::Null,
            },
        ]
    }

    #[tokio::test]
    async fn query_returns_answer_and_context_and_grows_history_by_two() {
        let conversations = Arc::new(ConversationStore::new());
        let pipeline = pipeline(some_matches(), Arc::clone(&conversations));

        let outcome = pipeline.query("how fast is heap insert?", "default").await.unwrap();
        assert_eq!(outcome.answer, "echo: how fast is heap insert?");
        assert_eq!(
            outcome.context,
            "heap insert is O(log n)\n\n---\n\nquicksort averages O(n log n)"
        );

        let conversation = conversations.get_or_create("default");
        let history = conversation.lock().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history.snapshot()[0], Turn::user("how fast is heap insert?"));
        assert_eq!(history.snapshot()[1].role, Role::Model);
    }

    #[tokio::test]
    async fn empty_retrieval_still_produces_an_answer() {
        let conversations = Arc::new(ConversationStore::new());
        let pipeline = pipeline(Vec::new(), Arc::clone(&conversations));

        let outcome = pipeline.query("anything in here?", "default").await.unwrap();
        assert_eq!(outcome.context, "");
        assert_eq!(outcome.answer, "echo: anything in here?");
    }

    #[tokio::test]
    async fn concurrent_queries_on_one_conversation_leave_wellformed_history() {
        let conversations = Arc::new(ConversationStore::new());
        let pipeline = Arc::new(pipeline(some_matches(), Arc::clone(&conversations)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    pipeline
                        .query(&format!("question {i}"), "shared")
                        .await
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let conversation = conversations.get_or_create("shared");
        let history = conversation.lock().await;
        assert_eq!(history.len(), 16);

        // Strict user/model alternation, with each answer echoing its own
        // question.
        for pair in history.snapshot().chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Model);
            assert_eq!(pair[1].text, format!("echo: {}", pair[0].text));
        }
    }

    #[tokio::test]
    async fn distinct_conversations_keep_separate_histories() {
        let conversations = Arc::new(ConversationStore::new());
        let pipeline = pipeline(some_matches(), Arc::clone(&conversations));

        pipeline.query("first in a", "a").await.unwrap();
        pipeline.query("first in b", "b").await.unwrap();
        pipeline.query("second in a", "a").await.unwrap();

        let a = conversations.get_or_create("a");
        let b = conversations.get_or_create("b");
        assert_eq!(a.lock().await.len(), 4);
        assert_eq!(b.lock().await.len(), 2);
    }
}
