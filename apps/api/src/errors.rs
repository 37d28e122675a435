use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::profile::folding::RemediationError;
use crate::session::controller::SubmitError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The extraction service failed. `text` is the submitted feedback, echoed
    /// back so the client can offer a retry without losing the input.
    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        text: String,
        timed_out: bool,
    },
}

impl AppError {
    pub fn from_submit(err: SubmitError, text: &str) -> Self {
        match err {
            SubmitError::InFlight => AppError::Conflict(err.to_string()),
            SubmitError::Extraction(e) => AppError::Extraction {
                timed_out: e.is_timeout(),
                message: e.to_string(),
                text: text.to_string(),
            },
        }
    }
}

impl From<RemediationError> for AppError {
    fn from(err: RemediationError) -> Self {
        match err {
            RemediationError::UnknownGap(_) => AppError::NotFound(err.to_string()),
            RemediationError::AlreadyStarted { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, text) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::Extraction {
                message,
                text,
                timed_out,
            } => {
                tracing::error!("Extraction error: {message}");
                if timed_out {
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        "EXTRACTION_TIMEOUT",
                        "The feedback analysis timed out. Please try again.".to_string(),
                        Some(text),
                    )
                } else {
                    (
                        StatusCode::BAD_GATEWAY,
                        "EXTRACTION_ERROR",
                        format!("Could not analyze the feedback: {message}"),
                        Some(text),
                    )
                }
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(text) = text {
            error["text"] = json!(text);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
