//! Typed error handling for the emporium API
//!
//! Every failure a handler can produce is an [`ApiError`]. At the HTTP
//! boundary it is rendered into the fixed error envelope:
//!
//! ```json
//! {
//!   "message": "your request could not be completed",
//!   "errors": ["invalid request parameters"]
//! }
//! ```
//!
//! # Error Categories
//!
//! - [`ApiError::InvalidParameter`]: malformed or out-of-range query parameter (400)
//! - [`ApiError::RecordNotFound`]: missing record or non-numeric id (404)
//! - [`ApiError::RecordInvalid`]: a write failed validation (422)
//! - [`ApiError::Storage`]: the backing store failed (500)
//!
//! Storage backends report failures through [`StoreError`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Message carried by every error envelope
pub const ERROR_MESSAGE: &str = "your request could not be completed";

/// The main error type returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    /// A query parameter was malformed or out of range
    InvalidParameter(String),

    /// The requested record does not exist (or the id is not a valid identifier)
    RecordNotFound(String),

    /// A write operation failed validation
    RecordInvalid(Vec<String>),

    /// The store failed; details are logged, never returned
    Storage(StoreError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            ApiError::RecordNotFound(msg) => write!(f, "{}", msg),
            ApiError::RecordInvalid(errors) => {
                write!(f, "Validation failed: {}", errors.join(", "))
            }
            ApiError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Error envelope sent to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always [`ERROR_MESSAGE`]
    pub message: String,
    /// One entry per problem found
    pub errors: Vec<String>,
}

impl ApiError {
    /// Build a not-found error using the record-lookup wording
    pub fn not_found(model: &str, raw_id: impl fmt::Display) -> Self {
        ApiError::RecordNotFound(format!("Couldn't find {} with 'id'={}", model, raw_id))
    }

    /// Build a single-message validation error
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::RecordInvalid(vec![message.into()])
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RecordInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidParameter(_) => "INVALID_PARAMETER",
            ApiError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            ApiError::RecordInvalid(_) => "RECORD_INVALID",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Convert to the client-facing envelope
    pub fn to_response(&self) -> ErrorResponse {
        let errors = match self {
            ApiError::InvalidParameter(msg) | ApiError::RecordNotFound(msg) => vec![msg.clone()],
            ApiError::RecordInvalid(errors) => errors.clone(),
            ApiError::Storage(_) => vec!["internal server error".to_string()],
        };

        ErrorResponse {
            message: ERROR_MESSAGE.to_string(),
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Storage(e) => tracing::error!(error = %e, "store operation failed"),
            other => tracing::debug!(code = other.error_code(), "{}", other),
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingReference { entity, .. } => {
                ApiError::invalid(format!("{} must exist", entity))
            }
            other => ApiError::Storage(other),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by [`Store`](crate::core::store::Store) implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A foreign key points at a record that does not exist
    #[error("{entity} with id {id} does not exist")]
    MissingReference { entity: &'static str, id: i64 },

    /// The in-memory tables were poisoned by a panicking writer
    #[error("storage lock poisoned")]
    Poisoned,

    /// A row could not be mapped back into a domain value
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The database driver reported a failure
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// A specialized Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A specialized Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Tests
// =============================================================================
