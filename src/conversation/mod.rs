//! Conversation history, keyed by conversation id
//!
//! History is process-wide shared mutable state, so each conversation lives
//! behind its own `tokio::sync::Mutex` and the query pipeline holds that lock
//! for the whole rewrite-retrieve-answer sequence. Two requests on the same
//! conversation therefore serialize end-to-end; requests on different
//! conversations run concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::types::Turn;

/// Conversation id used when the client does not supply one
pub const DEFAULT_CONVERSATION: &str = "default";

/// Ordered log of conversation turns.
///
/// Invariant: at any point where the lock is not held, the log contains only
/// questions actually asked and answers actually returned, in order. The
/// transient turn the query rewriter needs is built with [`with_candidate`]
/// and never touches the durable log.
///
/// [`with_candidate`]: Conversation::with_candidate
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the durable log
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Remove and return the most recent turn
    pub fn remove_last(&mut self) -> Option<Turn> {
        self.turns.pop()
    }

    /// Read-only view of the log, oldest first
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns in the log
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Build the transient turn sequence for query rewriting: the durable
    /// log followed by the candidate turn. The log itself is not mutated.
    pub fn with_candidate(&self, candidate: Turn) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.extend_from_slice(&self.turns);
        turns.push(candidate);
        turns
    }
}

/// Process-wide store of conversations
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: DashMap<String, Arc<Mutex<Conversation>>>,
}

impl ConversationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the conversation for `id`, creating it on first use
    pub fn get_or_create(&self, id: &str) -> Arc<Mutex<Conversation>> {
        self.conversations
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new())))
            .clone()
    }

    /// Number of known conversations
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether any conversation exists
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
