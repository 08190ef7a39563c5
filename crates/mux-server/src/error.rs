//! API error type and HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Request-level failure, mapped to a JSON `{"detail": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or semantically invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The addressed resource does not exist (or is not owned by the caller).
    #[error("{0}")]
    NotFound(String),

    /// Unexpected internal failure. The wire message is generic; the cause
    /// is logged, not leaked.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// 400 with the given detail message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 401 with the given detail message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// 404 with the given detail message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// 500 with the given detail message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(detail = %self, "Internal error");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<mux_storage::StorageError> for ApiError {
    fn from(e: mux_storage::StorageError) -> Self {
        error!(error = %e, "Storage failure");
        Self::Internal("Database error".to_string())
    }
}
