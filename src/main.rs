use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use financial_advisor_chat::config::ServerConfig;
use financial_advisor_chat::http::{serve, AppState};
use financial_advisor_chat::llm::GeminiClient;
use financial_advisor_chat::store::PgStore;
use financial_advisor_chat::{ChatAdvisor, Toolbox};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    let store = PgStore::connect(&config.database_url, config.db_max_connections)
        .await
        .context("connecting to the database")?;
    let toolbox = Toolbox::new(Arc::new(store));

    let model = GeminiClient::with_model(config.gemini_api_key.clone(), config.gemini_model.clone());
    tracing::info!("Using model {}", model.model());
    let advisor = ChatAdvisor::new(toolbox.clone(), Arc::new(model));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    serve(listener, AppState::new(advisor, toolbox)).await?;
    Ok(())
}
