//! HTTP route handlers

pub mod query;
pub mod upload;

pub use query::query;
pub use upload::upload;

/// Liveness probe
pub async fn health() -> &'static str {
    "OK"
}
