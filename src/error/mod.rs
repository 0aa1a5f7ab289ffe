//! Error types for the Herizon session client.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion, RejectReason};

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;

/// Primary error type for crate operations outside the auth lifecycle.
#[derive(Error, Debug)]
pub enum HerizonError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<toml::de::Error> for HerizonError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl HerizonError {
    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Auth(err) => err.category(),
            Self::Api(err) => err.category(),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::Auth(err) => err.recovery_suggestion(),
            Self::Configuration(_) => RecoverySuggestion::CheckConfiguration,
            other => match other.category() {
                ErrorCategory::Network | ErrorCategory::Timeout => {
                    RecoverySuggestion::CheckConnection
                }
                ErrorCategory::RateLimit => RecoverySuggestion::RetryLater,
                _ => RecoverySuggestion::None,
            },
        }
    }

    /// Message to surface to the user once for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => err.user_message(),
            other => other
                .recovery_suggestion()
                .user_message()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HerizonError>;
