use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::api::ApiError;
use crate::error::{ErrorCategory, RecoverySuggestion, RejectReason};

/// Normalized authentication errors across platforms and the auth backend.
///
/// `Clone` because one outcome is handed to every caller attached to the
/// same in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Login is not supported on this platform: {0}")]
    PlatformUnsupported(String),
    #[error("Login was cancelled")]
    UserCancelled,
    #[error("Timed out after {0}ms")]
    Timeout(u64),
    #[error("Platform login failed: {0}")]
    PlatformError(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Login rejected: {message}")]
    ExchangeRejected {
        reason: RejectReason,
        message: String,
    },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Session rejected by server: {0}")]
    ServerRejected(String),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("No local session")]
    NoLocalSession,
    #[error("Platform session expired")]
    PlatformSessionExpired,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl AuthError {
    /// Map a failed login-code exchange into the auth taxonomy.
    pub fn from_exchange_failure(error: ApiError) -> Self {
        match error {
            ApiError::Transport(message) => Self::Network(message),
            ApiError::Decode(message) => Self::MalformedResponse(message),
            ApiError::Status { message, .. } | ApiError::Business { message, .. } => {
                classify_exchange_message(&message)
            }
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PlatformUnsupported(_) | Self::UserCancelled | Self::PlatformError(_) => {
                ErrorCategory::Platform
            }
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::MalformedResponse(_) => ErrorCategory::Api,
            Self::ExchangeRejected { reason, .. } => match reason {
                RejectReason::RateLimited => ErrorCategory::RateLimit,
                RejectReason::Misconfigured => ErrorCategory::Configuration,
                RejectReason::InvalidCode | RejectReason::Other => ErrorCategory::Authentication,
            },
            Self::Network(_) => ErrorCategory::Network,
            Self::InvalidToken(_)
            | Self::ServerRejected(_)
            | Self::RefreshFailed(_)
            | Self::NoLocalSession
            | Self::PlatformSessionExpired => ErrorCategory::Authentication,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::ExchangeRejected { reason, .. } => match reason {
                RejectReason::InvalidCode => RecoverySuggestion::LogInAgain,
                RejectReason::RateLimited => RecoverySuggestion::RetryLater,
                RejectReason::Misconfigured => RecoverySuggestion::ContactSupport,
                RejectReason::Other => RecoverySuggestion::None,
            },
            Self::Network(_) | Self::Timeout(_) => RecoverySuggestion::CheckConnection,
            Self::InvalidToken(_)
            | Self::ServerRejected(_)
            | Self::NoLocalSession
            | Self::PlatformSessionExpired => RecoverySuggestion::LogInAgain,
            _ => RecoverySuggestion::None,
        }
    }

    /// Message to surface to the user once for this failure.
    ///
    /// Classified failures map onto a fixed message; anything else passes its
    /// raw message through.
    pub fn user_message(&self) -> String {
        if let Some(message) = self.recovery_suggestion().user_message() {
            return message.to_string();
        }
        match self {
            Self::ExchangeRejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Platform error codes and keywords the backend echoes when a code exchange
/// fails upstream.
fn errcode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(40029|40163|45011|40013|40125)\b").expect("valid regex"))
}

/// Classify a rejected exchange by the message the backend returned.
pub fn classify_exchange_message(message: &str) -> AuthError {
    let lower = message.to_ascii_lowercase();
    let reason = match errcode_pattern()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        Some("40029") | Some("40163") => RejectReason::InvalidCode,
        Some("45011") => RejectReason::RateLimited,
        Some("40013") | Some("40125") => RejectReason::Misconfigured,
        _ if lower.contains("network") || message.contains("网络") => {
            return AuthError::Network(message.to_string());
        }
        _ if lower.contains("code") || message.contains("授权码") => RejectReason::InvalidCode,
        _ if lower.contains("too frequent") || message.contains("频繁") => {
            RejectReason::RateLimited
        }
        _ if lower.contains("config") || message.contains("配置") => RejectReason::Misconfigured,
        _ => RejectReason::Other,
    };
    AuthError::ExchangeRejected {
        reason,
        message: message.to_string(),
    }
}
