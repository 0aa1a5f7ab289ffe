//! HTTP transport for the Herizon backend: the `{ code, data, message }`
//! envelope, identity header injection, and transport errors.

pub mod client;
pub mod envelope;

pub use client::{ApiClient, RequestOptions, IDENTITY_HEADER};
pub use envelope::{ApiEnvelope, SUCCESS_CODE};

use thiserror::Error;

use crate::error::ErrorCategory;

/// Failure of a single request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Envelope carried a non-success business code.
    #[error("{message} (code {code})")]
    Business { code: i64, message: String },
    /// Body was not an envelope, or `data` did not match the expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl ApiError {
    /// Message the backend attached to the failure, or a description of it.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(message) | Self::Decode(message) => message,
            Self::Status { message, .. } | Self::Business { message, .. } => message,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Network,
            Self::Status { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Business { code, .. } => match code {
                401 | 403 => ErrorCategory::Authentication,
                _ => ErrorCategory::Api,
            },
            Self::Decode(_) => ErrorCategory::Serialization,
        }
    }
}
