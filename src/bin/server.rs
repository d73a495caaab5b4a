//! RAG server binary

use pdf_chat::server::RagServer;
use pdf_chat::RagConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_chat=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env()?;

    tracing::info!(
        embed_model = config.gemini.embed_model,
        generate_model = config.gemini.generate_model,
        top_k = config.retrieval.top_k,
        "Starting PDF chat server"
    );

    let server = RagServer::new(config)?;
    server.start().await?;

    Ok(())
}
