//! Error handling for the POS Retail Suite backend
//!
//! Provides the logical error taxonomy of the count subsystem mapped
//! onto HTTP statuses: 400 for validation, 404 for missing resources,
//! 409 for illegal session-state transitions.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Scan submitted with no barcode, SKU, or variant id")]
    MissingIdentifier,

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Business logic errors
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<shared::CountError> for AppError {
    fn from(err: shared::CountError) -> Self {
        match err {
            shared::CountError::SessionFinalized => {
                AppError::InvalidSessionState("count session is finalized".to_string())
            }
            shared::CountError::NonPositiveQuantity => AppError::Validation {
                field: "qty".to_string(),
                message: "scan quantity must be positive".to_string(),
            },
            shared::CountError::QuantityOutOfRange => AppError::Validation {
                field: "qty".to_string(),
                message: "counted quantity exceeds the supported range".to_string(),
            },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_TOKEN".to_string(),
                    message: "Invalid token".to_string(),
                    field: None,
                },
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "TOKEN_EXPIRED".to_string(),
                    message: "Token has expired".to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::MissingIdentifier => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "MISSING_IDENTIFIER".to_string(),
                    message: "Provide a barcode, SKU, or variant id".to_string(),
                    field: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::VariantNotFound(ident) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "VARIANT_NOT_FOUND".to_string(),
                    message: format!("No catalog variant matches {}", ident),
                    field: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::InvalidSessionState(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "INVALID_SESSION_STATE".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
