//! Domain error types for the appraisal server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::schema::FieldError;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem operation failed
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Form validation failed with per-field violations
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Required server configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Outbound email dispatch failed
    #[error("Email delivery error: {0}")]
    Email(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Server is saturated and cannot take the request right now
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            // Internal failures: log the detail, return a generic message.
            AppError::Database(detail) => {
                tracing::error!("Database error: {}", detail);
                internal_response("DATABASE_ERROR", "An internal database error occurred")
            }
            AppError::FileSystem(detail) => {
                tracing::error!("Filesystem error: {}", detail);
                internal_response("STORAGE_ERROR", "An internal storage error occurred")
            }
            AppError::Configuration(detail) => {
                tracing::error!("Configuration error: {}", detail);
                internal_response(
                    "CONFIGURATION_ERROR",
                    "Server configuration error. Please contact support.",
                )
            }
            AppError::Email(detail) => {
                tracing::error!("Email delivery error: {}", detail);
                internal_response("EMAIL_ERROR", "Failed to dispatch notification email")
            }
            AppError::Validation(fields) => HttpResponse::UnprocessableEntity().json(
                ValidationErrorResponse {
                    error: "VALIDATION_FAILED".to_string(),
                    message: self.to_string(),
                    fields: fields.clone(),
                },
            ),
            AppError::NotFound(_) => HttpResponse::NotFound().json(ErrorResponse {
                error: "NOT_FOUND".to_string(),
                message: self.to_string(),
            }),
            AppError::InvalidInput(_) => HttpResponse::BadRequest().json(ErrorResponse {
                error: "INVALID_INPUT".to_string(),
                message: self.to_string(),
            }),
            AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(ErrorResponse {
                error: "UNAUTHORIZED".to_string(),
                message: self.to_string(),
            }),
            AppError::ServiceUnavailable(_) => {
                HttpResponse::ServiceUnavailable().json(ErrorResponse {
                    error: "SERVICE_UNAVAILABLE".to_string(),
                    message: self.to_string(),
                })
            }
        }
    }
}

fn internal_response(code: &str, message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: code.to_string(),
        message: message.to_string(),
    })
}

/// Error response body matching the OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Validation error response carrying the per-field violations.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub message: String,
    pub fields: Vec<FieldError>,
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid submission ID: {}", err))
    }
}
