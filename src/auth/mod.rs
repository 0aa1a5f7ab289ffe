//! Session and authentication lifecycle.
//!
//! A [`CredentialProvider`] obtains a one-time platform login code, the
//! [`AuthClient`] trades it for a session, a [`SessionStore`] keeps it, and
//! the [`SessionManager`] drives the whole lifecycle. [`PermissionGate`]
//! guards actions by role.

pub mod client;
pub mod credential;
pub mod error;
pub mod manager;
pub mod permission;
pub mod platform;
pub mod session;
pub mod store;

pub use client::{AuthClient, ExchangeRequest, HttpAuthClient};
pub use credential::{Credential, CredentialProvider, Platform, ProfileHints};
pub use error::AuthError;
pub use manager::{SessionManager, SessionSettings};
pub use permission::{role_satisfies, GateOptions, GateOutcome, PermissionGate, Prompter};
pub use platform::{detect, AppShellHost, HostCapabilities, HostFailure, MiniProgramHost};
pub use session::{DisplayInfo, LoginResult, Profile, Role, Session, SessionState, LOGGED_OUT_LEVEL};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreConfig, StoredRecord};
