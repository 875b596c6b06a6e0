//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache and its admin API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key derivation input could not be canonicalized
    #[error("Invalid key input: {0}")]
    InvalidKeyInput(String),

    /// TTL must be a positive number of seconds
    #[error("Invalid TTL: {0}")]
    InvalidTtl(u64),

    /// Value could not be represented as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Primary backend failure outside the recoverable set
    #[error("Backend error: {0}")]
    Backend(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_)
            | CacheError::InvalidKeyInput(_)
            | CacheError::InvalidTtl(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) | CacheError::Backend(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Backend Error Enum ==
/// Failure reported by the primary (shared) backend.
///
/// Only connectivity and timeout failures are expected operating conditions;
/// the cache degrades to its in-process tier for those and propagates the rest.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network, refused or dropped connection
    #[error("connection error: {0}")]
    Connection(String),

    /// Operation exceeded its time bound
    #[error("timed out: {0}")]
    Timeout(String),

    /// Protocol, type or server-side error
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Returns true for failures the cache absorbs by falling through.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BackendError::Connection(_) | BackendError::Timeout(_))
    }
}

impl From<redis::RedisError> for BackendError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal()
        {
            BackendError::Connection(err.to_string())
        } else {
            BackendError::Other(err.to_string())
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
