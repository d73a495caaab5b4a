//! Conversational query endpoint

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::conversation::DEFAULT_CONVERSATION;
use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Request body for `POST /query`
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The user's question, possibly a follow-up
    #[serde(default)]
    pub question: String,
    /// Conversation to continue; a shared default when omitted
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response body for `POST /query`
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub answer: String,
    pub context: String,
}

/// Handle `POST /query`: answer a question against the indexed documents
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(Error::Validation("Question is required".to_string()));
    }

    let conversation_id = request
        .conversation_id
        .as_deref()
        .unwrap_or(DEFAULT_CONVERSATION);

    let outcome = state.chat().query(question, conversation_id).await?;

    Ok(Json(QueryResponse {
        success: true,
        answer: outcome.answer,
        context: outcome.context,
    }))
}
