use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health
/// Returns service version plus the configured LLM backend, so a deploy's
/// provider selection is visible without reading its environment.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "hrprep-api",
        "llm_provider": state.config.llm_provider,
    }))
}

/// GET /api/judge/health
/// Separate liveness probe for the judging endpoints.
pub async fn judge_health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "content-judge"
    }))
}
