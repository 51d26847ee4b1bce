//! Crate-wide error type.
//!
//! Variants follow the failure taxonomy of the transfer pipeline: transport
//! failures, HTTP rejections, malformed responses, and local I/O. A user
//! dismissing a save prompt is not an error and has no variant here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// No response at all: DNS, connect, reset, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("Rejected: status={status}, {message}")]
    Rejected { status: u16, message: String },

    /// The body did not have the expected shape.
    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transport failures and 5xx rejections may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Network(_) => true,
            AppError::Rejected { status, .. } => (500..600).contains(status),
            AppError::Api(_) | AppError::Io(_) | AppError::Storage(_) | AppError::Internal(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => AppError::Api(err.to_string()),
            None => AppError::Network(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
