//! Context-grounded answer generation and history bookkeeping

use std::sync::Arc;

use crate::conversation::Conversation;
use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::Turn;

/// Phrase the model is told to use when the context lacks the answer
pub const FALLBACK_ANSWER: &str = "I could not find the answer in the provided document.";

/// Generates the grounded answer and records both turns in the history.
///
/// The user turn is appended before generation so the model sees it as the
/// final turn; on failure it is rolled back so history never records a
/// question with no answer.
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Answer `question` using only `context`, appending exactly two turns
    /// to `history` on success and none on failure.
    pub async fn answer(
        &self,
        question: &str,
        context: &str,
        history: &mut Conversation,
    ) -> Result<String> {
        let instruction = answer_instruction(context);

        history.append(Turn::user(question));

        match self.llm.generate(history.snapshot(), &instruction).await {
            Ok(answer) => {
                let answer = answer.trim().to_string();
                history.append(Turn::model(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                history.remove_last();
                Err(e)
            }
        }
    }
}

/// Build the answering instruction with the retrieved context embedded
fn answer_instruction(context: &str) -> String {
    format!(
        "You are a Data Structure and Algorithm expert. Answer the user's question based only on the following context. If the answer is not in the context, say \"{FALLBACK_ANSWER}\"\n\nContext:\n{context}"
    )
}
