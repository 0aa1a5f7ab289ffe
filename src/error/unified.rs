//! Unified error classification and recovery.

use serde::{Deserialize, Serialize};

/// Why the server refused a login-code exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The one-time code is invalid, expired or already consumed.
    InvalidCode,
    /// The platform or backend throttled the exchange.
    RateLimited,
    /// The app identity or backend login configuration is wrong.
    Misconfigured,
    Other,
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Platform,
    Server,
    Api,
    Configuration,
    Serialization,
    Storage,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    LogInAgain,
    RetryLater,
    CheckConnection,
    ContactSupport,
    CheckConfiguration,
    /// Nothing to suggest; show the raw message.
    None,
}

impl RecoverySuggestion {
    /// Short message suitable for a toast, if this suggestion has one.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            Self::LogInAgain => Some("Login is invalid or expired, please log in again"),
            Self::RetryLater => Some("Too many attempts, please try again later"),
            Self::CheckConnection => {
                Some("Network connection failed, please check your connection")
            }
            Self::ContactSupport => Some("Login is misconfigured, please contact support"),
            Self::CheckConfiguration => Some("Client configuration is invalid"),
            Self::None => None,
        }
    }
}
