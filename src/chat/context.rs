//! Context assembly from retrieved matches

use crate::types::RetrievedMatch;

/// Separator placed between retrieved chunks in the assembled context
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Joins retrieved chunk texts into the context block shown to the model
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    /// Optional upper bound on assembled context length in characters
    max_chars: Option<usize>,
}

impl ContextAssembler {
    pub fn new(max_chars: Option<usize>) -> Self {
        Self { max_chars }
    }

    /// Join match texts in retrieval order.
    ///
    /// When a length bound is set, whole matches are dropped from the tail
    /// once the bound is reached; a match is never cut mid-text.
    pub fn assemble(&self, matches: &[RetrievedMatch]) -> String {
        let mut context = String::new();

        for m in matches {
            let addition = if context.is_empty() {
                m.text.len()
            } else {
                CONTEXT_DELIMITER.len() + m.text.len()
            };

            if let Some(max) = self.max_chars {
                if !context.is_empty() && context.len() + addition > max {
                    break;
                }
            }

            if !context.is_empty() {
                context.push_str(CONTEXT_DELIMITER);
            }
            context.push_str(&m.text);
        }

        context
    }
}
