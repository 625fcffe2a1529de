use std::sync::Arc;

use crate::config::Config;
use crate::llm::factory::LlmFactory;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Single point of access to the active LLM backend. The factory memoizes
    /// the provider, so cloning the state is cheap and every handler sees the
    /// same instance.
    pub llm: Arc<LlmFactory>,
    pub config: Config,
}
