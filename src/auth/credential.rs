//! Platform login credentials and the provider seam that acquires them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::error::AuthError;

/// Host platform a credential provider targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Platform {
    /// Embedded mini-program with a native login primitive and its own session.
    MiniProgram,
    /// Generic app shell exposing registered OAuth providers.
    AppShell,
    /// Plain web browser; no platform login.
    Browser,
}

impl Platform {
    /// `registerSource` tag sent with the code exchange.
    pub fn register_source(self) -> u8 {
        match self {
            Self::MiniProgram => 2,
            Self::AppShell => 3,
            Self::Browser => 1,
        }
    }
}

/// Nickname/avatar the host can hand over without an extra authorization
/// step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileHints {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

/// One-time platform login code. Consumed by exactly one successful
/// exchange and never persisted; a rejected code must be re-acquired.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub code: String,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("code", &"..")
            .field("nickname", &self.nickname)
            .field("avatar", &self.avatar)
            .finish()
    }
}

impl Credential {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            nickname: None,
            avatar: None,
        }
    }

    pub fn with_hints(mut self, hints: ProfileHints) -> Self {
        self.nickname = hints.nickname;
        self.avatar = hints.avatar;
        self
    }
}

/// Obtains login credentials from the host platform.
///
/// One implementation per [`Platform`], chosen at startup by
/// [`super::platform::detect`].
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn platform(&self) -> Platform;

    /// Acquire a fresh one-time code. With `want_profile_hints`, attach
    /// nickname/avatar when the host has them; their absence is not an error.
    async fn acquire(&self, want_profile_hints: bool) -> Result<Credential, AuthError>;

    /// Whether platform login can work in this environment at all.
    async fn supports_login(&self) -> bool;

    /// Whether a credential login may run without user interaction.
    fn supports_silent_login(&self) -> bool {
        false
    }

    /// Liveness of the platform's own login session, or `None` when the
    /// platform keeps no session of its own.
    async fn platform_session_alive(&self) -> Option<bool> {
        None
    }
}
