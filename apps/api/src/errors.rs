use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed caller input (missing field, wrong enum value, empty text).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mapped LLM result failed a domain sanity check (out-of-range score,
    /// empty required field, wrong list length). Surfaced, never patched over
    /// with defaults.
    #[error("LLM output validation error: {0}")]
    OutputValidation(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::OutputValidation(msg) => {
                tracing::error!("LLM output rejected: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_OUTPUT_INVALID",
                    "The AI response failed validation".to_string(),
                )
            }
            AppError::Llm(LlmError::Configuration(msg)) => {
                tracing::error!("LLM configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_CONFIGURATION_ERROR",
                    "The AI backend is misconfigured".to_string(),
                )
            }
            AppError::Llm(e @ LlmError::Provider { .. }) => {
                tracing::error!("LLM provider error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_PROVIDER_ERROR",
                    "The AI backend is unavailable".to_string(),
                )
            }
            AppError::Llm(LlmError::Parse { reason, raw }) => {
                tracing::error!(raw, "LLM parse error: {reason}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_PARSE_ERROR",
                    "The AI response could not be parsed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let response = AppError::Validation("role is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_provider_error_maps_to_502() {
        let response = AppError::Llm(LlmError::Provider {
            attempts: 4,
            message: "retries exhausted".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_output_validation_maps_to_500() {
        let response =
            AppError::OutputValidation("score 150 out of range".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
