use crate::services::{expander::ExpandError, object_store::StorageError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let status = match &err {
            StorageError::BucketNotFound(_) | StorageError::ObjectNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            StorageError::BucketAlreadyExists(_) => StatusCode::CONFLICT,
            StorageError::InvalidBucketName { .. } | StorageError::InvalidObjectKey(_) => {
                StatusCode::BAD_REQUEST
            }
            StorageError::Backend(_) | StorageError::Sqlx(_) | StorageError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError::new(status, err.to_string())
    }
}

/// Malformed keys are the caller's fault; every other expansion failure is
/// fatal for the invocation.
impl From<ExpandError> for AppError {
    fn from(err: ExpandError) -> Self {
        match err {
            ExpandError::Decoding { .. } => AppError::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => AppError::internal(other.to_string()),
        }
    }
}
