//! Per-platform credential providers and runtime selection.
//!
//! The host application describes what it can do through
//! [`HostCapabilities`]; [`detect`] turns that into the matching
//! [`CredentialProvider`].

pub mod app_shell;
pub mod browser;
pub mod mini_program;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use app_shell::AppShellProvider;
pub use browser::BrowserProvider;
pub use mini_program::MiniProgramProvider;

use super::credential::{CredentialProvider, ProfileHints};

/// OAuth provider id the app shell must have registered.
pub const OAUTH_PROVIDER: &str = "weixin";

/// Failure reported by a host login primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostFailure {
    Cancelled,
    Failed(String),
}

/// Login primitives of an embedded mini-program host.
#[async_trait]
pub trait MiniProgramHost: Send + Sync {
    /// Run the native login; yields the one-time code (possibly empty).
    async fn login(&self) -> Result<String, HostFailure>;
    /// Whether the host's own login session is still valid.
    async fn check_session(&self) -> bool;
    /// Profile data available without prompting the user.
    fn profile_hints(&self) -> Option<ProfileHints> {
        None
    }
}

/// Login primitives of a generic app shell.
#[async_trait]
pub trait AppShellHost: Send + Sync {
    /// Registered OAuth provider ids.
    async fn oauth_providers(&self) -> Result<Vec<String>, HostFailure>;
    async fn login(&self, provider: &str) -> Result<String, HostFailure>;
    fn profile_hints(&self) -> Option<ProfileHints> {
        None
    }
}

/// What the running host offers, discovered at startup.
#[derive(Clone)]
pub enum HostCapabilities {
    MiniProgram(Arc<dyn MiniProgramHost>),
    AppShell(Arc<dyn AppShellHost>),
    Browser,
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MiniProgram(_) => f.write_str("MiniProgram(..)"),
            Self::AppShell(_) => f.write_str("AppShell(..)"),
            Self::Browser => f.write_str("Browser"),
        }
    }
}

/// Select the credential provider for the running host.
pub fn detect(capabilities: HostCapabilities, login_timeout: Duration) -> Arc<dyn CredentialProvider> {
    match capabilities {
        HostCapabilities::MiniProgram(host) => {
            Arc::new(MiniProgramProvider::new(host).with_timeout(login_timeout))
        }
        HostCapabilities::AppShell(host) => Arc::new(AppShellProvider::new(host)),
        HostCapabilities::Browser => Arc::new(BrowserProvider),
    }
}
