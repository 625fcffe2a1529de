pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::briefing::briefing_handler;
use crate::http_log::log_requests;
use crate::interview::handlers;
use crate::master_judge::master_judge_handler;
use crate::resume::handlers::{analyze_resume, upload_resume, MAX_UPLOAD_BYTES};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Interview loop
        .route("/api/interview/reply", post(handlers::interviewer_reply))
        .route("/api/interview/question", post(handlers::next_question))
        .route("/api/interview/hint", post(handlers::question_hint))
        .route("/api/interview/evaluate", post(handlers::evaluate))
        .route("/api/interview/report", post(handlers::final_report))
        // Judging
        .route("/api/judge/health", get(health::judge_health_handler))
        .route("/api/judge/content", post(handlers::judge))
        .route("/api/judge/master", post(master_judge_handler))
        // Briefing
        .route("/api/briefing", post(briefing_handler))
        // Resume intake
        .route("/api/resume/upload", post(upload_resume))
        .route("/api/resume/analyze", post(analyze_resume))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
