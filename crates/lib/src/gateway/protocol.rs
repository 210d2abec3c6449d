//! Gateway wire conventions: routes, the health text, and error bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::prompt::PromptError;

pub const VALIDATE_PROMPT_PATH: &str = "/api/v1/validate-prompt";
pub const HEALTH_PATH: &str = "/api/v1/health";
pub const HEALTH_TEXT: &str = "Backend is running";

/// Request failures that never reach the evaluator.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] PromptError),
}

impl ApiError {
    pub fn status_and_body(&self) -> (StatusCode, Value) {
        match self {
            ApiError::Unauthorized(e) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized", "detail": e.to_string() }),
            ),
            ApiError::InvalidJson(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid JSON", "detail": e.to_string() }),
            ),
            ApiError::Validation(PromptError::Validation(issues)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "issues": issues }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}
