//! Convenience re-exports for common use.

pub use crate::auth::{
    AuthError, Credential, CredentialProvider, GateOptions, GateOutcome, HostCapabilities,
    PermissionGate, Platform, Profile, Prompter, Role, Session, SessionManager, SessionState,
};
pub use crate::config::ClientConfig;
pub use crate::error::{HerizonError, Result};
