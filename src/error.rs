use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy of the portal. Every failure is scoped to one in-flight
/// operation; nothing here is process-fatal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Caller-supplied data violated an input contract. The message names
    /// the first violated rule.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity id did not resolve.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Transport or persistence failure. Not retried by this layer.
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(err: impl Into<anyhow::Error>) -> Self {
        Self::Storage(err.into())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub request_id: String,
}

impl AppError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            request_id: request_id.into(),
        }
    }

    pub fn from_portal(err: PortalError, request_id: impl Into<String>) -> Self {
        let (status, code) = match &err {
            PortalError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PortalError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PortalError::Storage(_) => (StatusCode::BAD_GATEWAY, "STORAGE_ERROR"),
        };
        Self::new(status, code, err.to_string(), request_id)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let payload = ErrorBody {
            error: ErrorPayload {
                code: self.code,
                message: self.message,
                request_id: self.request_id,
            },
        };
        (self.status, Json(payload)).into_response()
    }
}
