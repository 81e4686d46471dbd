use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::resume::validation::Violation;

/// Errors raised by the résumé core (registry, aggregate, validator, mapper).
/// All of them are recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResumeError {
    #[error("Invalid section schema: {0}")]
    SchemaInvalid(String),

    #[error("Section {section_id} already holds the maximum of {max} items")]
    CardinalityExceeded { section_id: Uuid, max: u32 },

    #[error("Section {section_id} must keep at least {min} items")]
    CardinalityViolated { section_id: Uuid, min: u32 },

    #[error("Validation failed with {} violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrityViolation(String),

    #[error("Merge conflict: {0}")]
    MergeConflict(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Resume(#[from] ResumeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Resume(err) => {
                let (status, code) = match err {
                    ResumeError::SchemaInvalid(_) => (StatusCode::BAD_REQUEST, "SCHEMA_INVALID"),
                    ResumeError::CardinalityExceeded { .. } => {
                        (StatusCode::CONFLICT, "CARDINALITY_EXCEEDED")
                    }
                    ResumeError::CardinalityViolated { .. } => {
                        (StatusCode::CONFLICT, "CARDINALITY_VIOLATED")
                    }
                    ResumeError::ValidationFailed(violations) => {
                        details = Some(json!(violations));
                        (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED")
                    }
                    ResumeError::ReferentialIntegrityViolation(_) => {
                        (StatusCode::BAD_REQUEST, "REFERENTIAL_INTEGRITY_VIOLATION")
                    }
                    ResumeError::MergeConflict(_) => (StatusCode::CONFLICT, "MERGE_CONFLICT"),
                };
                (status, code, err.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Pdf(msg) => {
                tracing::error!("PDF error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PDF_ERROR",
                    "The PDF could not be generated".to_string(),
                )
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
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
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
