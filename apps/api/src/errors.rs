use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::flows::validation::ValidationError;
use crate::flows::{FlowError, GenerationError};
use crate::wizard::WizardError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::Validation(v) => AppError::Validation(v),
            FlowError::Generation(g) => AppError::Generation(g),
        }
    }
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::single(field, message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(v) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", v.to_string()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Generation(e) => generation_status(e),
            AppError::Wizard(e) => (StatusCode::BAD_REQUEST, "WIZARD_ERROR", e.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
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

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::Validation(v) = &self {
            error["fields"] = json!(v.errors);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn generation_status(e: &GenerationError) -> (StatusCode, &'static str, String) {
    match e {
        GenerationError::EmptyOutput => {
            (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_OUTPUT", e.to_string())
        }
        GenerationError::ModelReportedError(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "MODEL_REPORTED_ERROR",
            msg.clone(),
        ),
        GenerationError::IncompleteOutput(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INCOMPLETE_OUTPUT",
            e.to_string(),
        ),
        GenerationError::ShapeMismatch(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "SHAPE_MISMATCH",
            "The translation did not match the original structure.".to_string(),
        ),
        GenerationError::Transport(inner) => {
            tracing::error!("Model transport error: {inner}");
            let message = if inner.is_overloaded() {
                "The reading service is overloaded. Please try again in a moment."
            } else {
                "The reading service is unavailable. Please try again later."
            };
            (StatusCode::BAD_GATEWAY, "MODEL_UNAVAILABLE", message.to_string())
        }
    }
}
