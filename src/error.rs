//! Storage error types and error response formatting.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Coarse classification of a storage failure.
///
/// Callers branch on this to pick an outward status; the finer
/// [`ErrorCode`] is what ends up on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    AlreadyExists,
    NotFound,
    Io,
    Internal,
}

/// Error codes reported by the blob service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument,
    ContainerAlreadyExists,
    ContainerNotFound,
    BlobNotFound,
    IoError,
    InternalError,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::ContainerAlreadyExists => "ContainerAlreadyExists",
            ErrorCode::ContainerNotFound => "ContainerNotFound",
            ErrorCode::BlobNotFound => "BlobNotFound",
            ErrorCode::IoError => "IoError",
            ErrorCode::InternalError => "InternalError",
        }
    }

    /// Folds the code into its classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::InvalidArgument => ErrorKind::InvalidArgument,
            ErrorCode::ContainerAlreadyExists => ErrorKind::AlreadyExists,
            ErrorCode::ContainerNotFound | ErrorCode::BlobNotFound => ErrorKind::NotFound,
            ErrorCode::IoError => ErrorKind::Io,
            ErrorCode::InternalError => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Io | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "One of the request inputs is not valid.",
            ErrorCode::ContainerAlreadyExists => "The specified container already exists.",
            ErrorCode::ContainerNotFound => "The specified container does not exist.",
            ErrorCode::BlobNotFound => "The specified blob does not exist.",
            ErrorCode::IoError => "The server failed to access its data directory.",
            ErrorCode::InternalError => {
                "The server encountered an internal error. Please retry the request."
            }
        }
    }
}

/// Storage error with code and message.
#[derive(Debug, Error)]
#[error("{}: {}", .code.as_str(), .message)]
pub struct StorageError {
    pub code: ErrorCode,
    pub message: String,
}

impl StorageError {
    /// Creates a new storage error with the given code and default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.default_message().to_string(),
            code,
        }
    }

    /// Creates a new storage error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Wraps a filesystem failure, keeping the operation that hit it.
    pub fn io(context: &str, err: std::io::Error) -> Self {
        Self::with_message(ErrorCode::IoError, format!("{}: {}", context, err))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Whether this error reflects a server-side fault rather than a bad request.
    pub fn is_server_fault(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io | ErrorKind::Internal)
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();

        // Filesystem details stay in the logs, not in the response body.
        let message = if self.is_server_fault() {
            self.code.default_message().to_string()
        } else {
            self.message
        };

        let body = json!({
            "error": {
                "code": self.code.as_str(),
                "message": message,
            }
        });

        (
            status,
            [(header::HeaderName::from_static("x-ms-error-code"), self.code.as_str())],
            Json(body),
        )
            .into_response()
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
