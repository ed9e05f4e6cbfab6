//! Unified error handling for Tollgate
//!
//! This module provides the error type shared by the rating engine, the
//! account model, the storage backends and the HTTP layer, with automatic
//! HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Storage Errors ====================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Not Found ====================
    #[error("Rating profile not found: {0}")]
    RatingProfileNotFound(String),

    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Actions not found: {0}")]
    ActionsNotFound(String),

    // ==================== Business Logic Errors ====================
    #[error("Insufficient {category}: required {required}, available {available}")]
    InsufficientResource {
        category: String,
        required: String,
        available: String,
    },

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }

            // 402 Payment Required
            AppError::InsufficientResource { .. } => StatusCode::PAYMENT_REQUIRED,

            // 404 Not Found
            AppError::RatingProfileNotFound(_)
            | AppError::DestinationNotFound(_)
            | AppError::AccountNotFound(_)
            | AppError::ActionsNotFound(_) => StatusCode::NOT_FOUND,

            // 503 Service Unavailable
            AppError::CacheConnection(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "storage_error",
            AppError::Cache(_) => "cache_error",
            AppError::CacheConnection(_) => "cache_connection_error",
            AppError::RatingProfileNotFound(_) => "rating_profile_not_found",
            AppError::DestinationNotFound(_) => "destination_not_found",
            AppError::AccountNotFound(_) => "account_not_found",
            AppError::ActionsNotFound(_) => "actions_not_found",
            AppError::InsufficientResource { .. } => "insufficient_resource",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingField(_) => "missing_field",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// True for the recoverable "not found" family
    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NOT_FOUND
    }

    /// Shorthand for an insufficient-resource failure
    pub fn insufficient(
        category: impl ToString,
        required: impl ToString,
        available: impl ToString,
    ) -> Self {
        AppError::InsufficientResource {
            category: category.to_string(),
            required: required.to_string(),
            available: available.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
