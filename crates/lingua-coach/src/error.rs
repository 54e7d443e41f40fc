//! Error types shared across the store, completion, speech and HTTP layers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors raised by a [`crate::profile_db::ProfileStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection pool could not hand out a connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// SQLite query or statement failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Stored row holds a value the domain model cannot represent.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`crate::completion::CompletionClient`].
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Network or timeout failure talking to the completion backend.
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("completion backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the chat completion shape.
    #[error("malformed completion payload: {0}")]
    Malformed(String),

    /// Backend answered without any choices.
    #[error("completion backend returned no choices")]
    NoChoices,
}

/// Errors raised by a [`crate::speech::SpeechSynthesizer`].
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis is disabled")]
    Disabled,

    #[error("speech request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("speech backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to write audio file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("upstream service failed: {0}")]
    Upstream(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                StatusCode::BAD_GATEWAY
            }
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(err) => {
                tracing::error!("Storage error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
