use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use shop_rag::QueryService;
use shop_rag::openai::{OpenAIChatSynthesizer, OpenAIEmbeddingProvider};
use shop_rag_server::{ServerConfig, run_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    if config.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set. RAG features will fail.");
    }

    let openai = config.openai();
    let embedder =
        OpenAIEmbeddingProvider::new(openai.clone())?.with_model(config.embedding_model.as_str());
    let synthesizer = OpenAIChatSynthesizer::new(openai)?.with_model(config.chat_model.as_str());
    let service = Arc::new(
        QueryService::builder()
            .config(config.rag.clone())
            .embedding_provider(Arc::new(embedder))
            .synthesizer(Arc::new(synthesizer))
            .build()?,
    );

    match service.initialize().await {
        Ok(outcome) => info!(?outcome, "startup ingestion finished"),
        Err(e) => warn!(error = %e, "failed to initialize vector store"),
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for shop-rag-server")?;
    run_server(addr, service).await
}
