//! Error types for the RAG pipelines

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG pipeline errors
///
/// Each pipeline stage fails fast with its own variant; no stage swallows an
/// error. The HTTP layer maps `Validation` to `400` and everything else to
/// `500` with the `{"success": false, "error": ...}` envelope.
#[derive(Debug, Error)]
pub enum Error {
    /// No file in the upload, or the uploaded payload could not be written
    #[error("Upload error: {0}")]
    Upload(String),

    /// The document loader could not produce text
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Embedding service failure or rate limit
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index upsert/query failure
    #[error("Vector index error: {0}")]
    Index(String),

    /// Language model call failure
    #[error("Answer generation failed: {0}")]
    Generation(String),

    /// Missing or empty question
    #[error("{0}")]
    Validation(String),

    /// An external call exceeded its timeout budget
    #[error("{service} call timed out after {budget_secs}s")]
    UpstreamTimeout {
        service: &'static str,
        budget_secs: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an upload error
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload(message.into())
    }

    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let response = Error::Validation("Question is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pipeline_errors_map_to_internal_server_error() {
        for err in [
            Error::upload("no file"),
            Error::extraction("a.pdf", "bad xref"),
            Error::embedding("rate limited"),
            Error::index("upsert failed"),
            Error::generation("model unavailable"),
            Error::UpstreamTimeout {
                service: "gemini",
                budget_secs: 30,
            },
        ] {
            assert_eq!(
                err.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}
