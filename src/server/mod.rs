//! HTTP server

pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::RagConfig;
use crate::error::Result;

pub use state::AppState;

/// The RAG HTTP server
pub struct RagServer {
    state: AppState,
}

impl RagServer {
    /// Create a server from configuration, wiring the production providers
    pub fn new(config: RagConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Create a server over prebuilt state
    pub fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route(
                "/upload",
                post(routes::upload)
                    .layer(DefaultBodyLimit::max(self.state.config().server.max_upload_size)),
            )
            .route("/query", post(routes::query))
            .route("/health", get(routes::health))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve until shutdown
    pub async fn start(&self) -> Result<()> {
        let addr = format!(
            "{}:{}",
            self.state.config().server.host,
            self.state.config().server.port
        );

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        let router = self.build_router();
        axum::serve(listener, router).await?;

        Ok(())
    }
}
