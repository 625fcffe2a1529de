mod briefing;
mod config;
mod errors;
mod http_log;
mod interview;
mod llm;
mod master_judge;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm::factory::LlmFactory;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on a missing provider credential)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HRprep API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the LLM factory and resolve the provider once so a
    // misconfiguration surfaces at startup, not on the first request.
    let llm = Arc::new(LlmFactory::new(config.llm_config()));
    let provider = llm.provider()?;
    info!("Active LLM backend: {}", provider.provider_name());

    let state = AppState {
        llm,
        config: config.clone(),
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
