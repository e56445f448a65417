//! Error Types for the Schemata API
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct carrying a code and a client-facing message
//! - ErrorCode enum mapping each category to an HTTP status
//! - IntoResponse rendering `{"error": "<message>"}`
//!
//! Store failures are logged in full and reach clients only as a generic
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemata_core::{ExplorerError, IntrospectionError};
use std::fmt;

use crate::config::ConfigError;

/// Message returned for every server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ========================================================================
    // Request Errors (400, 408, 413)
    // ========================================================================
    /// A field value does not match its column kind
    InvalidFieldType,

    /// A required field is missing from a create body
    FieldRequired,

    /// Path id is not an integer >= 1
    InvalidId,

    /// Body is not a JSON object or form
    InvalidBody,

    /// Path segments could not be decoded
    InvalidPath,

    /// Body exceeds the configured limit
    PayloadTooLarge,

    /// Request outlived the configured timeout
    RequestTimeout,

    // ========================================================================
    // Routing Errors (404, 405)
    // ========================================================================
    /// Table is not in the catalog
    UnknownTable,

    /// No row has the requested primary key
    RecordNotFound,

    /// Path has more segments than any route
    UnknownPath,

    /// Method is not served on this path
    MethodNotAllowed,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Database operation failed
    DatabaseError,

    /// Configuration could not be loaded
    InvalidConfig,

    /// Internal server error
    InternalError,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,

    /// Service is temporarily unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidFieldType
            | ErrorCode::FieldRequired
            | ErrorCode::InvalidId
            | ErrorCode::InvalidBody
            | ErrorCode::InvalidPath => StatusCode::BAD_REQUEST,

            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::RequestTimeout => StatusCode::REQUEST_TIMEOUT,

            ErrorCode::UnknownTable | ErrorCode::RecordNotFound | ErrorCode::UnknownPath => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,

            ErrorCode::ConnectionPoolExhausted | ErrorCode::ServiceUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::DatabaseError | ErrorCode::InvalidConfig | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFieldType => "invalid field type",
            ErrorCode::FieldRequired => "field is required",
            ErrorCode::InvalidId => "entry id must be int >= 1",
            ErrorCode::InvalidBody => "invalid request body",
            ErrorCode::InvalidPath => "invalid path",
            ErrorCode::PayloadTooLarge => "request body too large",
            ErrorCode::RequestTimeout => "request timed out",
            ErrorCode::UnknownTable => "unknown table",
            ErrorCode::RecordNotFound => "record not found",
            ErrorCode::UnknownPath => "unknown path",
            ErrorCode::MethodNotAllowed => "method not allowed",
            ErrorCode::ConnectionPoolExhausted | ErrorCode::ServiceUnavailable => {
                "service unavailable"
            }
            ErrorCode::DatabaseError | ErrorCode::InvalidConfig | ErrorCode::InternalError => {
                INTERNAL_ERROR_MESSAGE
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Client-facing message
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an error with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn unknown_table() -> Self {
        Self::from_code(ErrorCode::UnknownTable)
    }

    pub fn record_not_found() -> Self {
        Self::from_code(ErrorCode::RecordNotFound)
    }

    pub fn unknown_path() -> Self {
        Self::from_code(ErrorCode::UnknownPath)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(ErrorCode::MethodNotAllowed)
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidBody, message)
    }

    pub fn invalid_path() -> Self {
        Self::from_code(ErrorCode::InvalidPath)
    }

    pub fn request_timeout() -> Self {
        Self::from_code(ErrorCode::RequestTimeout)
    }

    pub fn payload_too_large() -> Self {
        Self::from_code(ErrorCode::PayloadTooLarge)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Generic database failure; details belong in the log, not here.
    pub fn database_error() -> Self {
        Self::from_code(ErrorCode::DatabaseError)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({ "error": self.message }));
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Map request-time failures onto their HTTP category.
impl From<ExplorerError> for ApiError {
    fn from(err: ExplorerError) -> Self {
        let message = err.to_string();
        match err {
            ExplorerError::UnknownTable { .. } => ApiError::unknown_table(),
            ExplorerError::RecordNotFound => ApiError::record_not_found(),
            ExplorerError::InvalidFieldType { .. }
            | ExplorerError::UnknownField { .. }
            | ExplorerError::Coercion(_) => ApiError::new(ErrorCode::InvalidFieldType, message),
            ExplorerError::FieldRequired { .. } => ApiError::new(ErrorCode::FieldRequired, message),
            ExplorerError::InvalidIdentifier(_) => ApiError::from_code(ErrorCode::InvalidId),
            ExplorerError::Store(store) => {
                tracing::error!(error = %store, "Store error");
                ApiError::database_error()
            }
        }
    }
}

impl From<IntrospectionError> for ApiError {
    fn from(err: IntrospectionError) -> Self {
        tracing::error!(error = %err, "Catalog construction failed");
        ApiError::internal_error(format!("catalog construction failed: {}", err))
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_config(err.to_string())
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::database_error()
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                ApiError::from_code(ErrorCode::ConnectionPoolExhausted)
            }
            deadpool_postgres::PoolError::Closed => {
                ApiError::from_code(ErrorCode::ServiceUnavailable)
            }
            _ => ApiError::database_error(),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
