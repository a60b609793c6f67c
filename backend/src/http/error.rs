//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::EphemerisError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Always `"error"`
    pub status: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Last cached timestamp, for ranges past the cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon: Option<i64>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            code: code.into(),
            message: message.into(),
            details: None,
            horizon: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Nothing cached to answer with
    NotFound(String),
    /// Invalid query parameters
    BadRequest(String),
    /// Update body that is not a `vars` map of integer pairs, or names an unknown body
    BadPayload(String),
    /// Missing or wrong update key
    Unauthorized,
    /// Requested range runs past the cache
    Exhausted { horizon: Option<i64> },
    Internal(String),
    /// Engine error
    Engine(EphemerisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::BadPayload(details) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("BAD_PAYLOAD", "Bad Payload").with_details(details),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", "Unauthorized"),
            ),
            AppError::Exhausted { horizon } => {
                let mut error = ApiError::new(
                    "CACHE_EXHAUSTED",
                    "requested range runs past the cached events",
                );
                error.horizon = horizon;
                (StatusCode::CONFLICT, error)
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Engine(e) => match e {
                EphemerisError::Configuration(msg) => {
                    (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
                }
                EphemerisError::InvalidRange { .. } => {
                    (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", e.to_string()))
                }
                EphemerisError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("STORAGE_ERROR", e.to_string()),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("ENGINE_ERROR", e.to_string()),
                ),
            },
        };

        (status, Json(error)).into_response()
    }
}

impl From<EphemerisError> for AppError {
    fn from(err: EphemerisError) -> Self {
        AppError::Engine(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}
