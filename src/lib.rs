//! Herizon session client
//!
//! Client-side session and authentication lifecycle for the Herizon
//! community app: platform credential acquisition, code exchange, local
//! session persistence, transparent refresh, server-side validation and
//! role-based permission gating.
//!
//! # Quick Start
//!
//! ```no_run
//! use herizon_session::prelude::*;
//!
//! # async fn example() -> herizon_session::error::Result<()> {
//! let config = ClientConfig::load()?;
//! let manager = SessionManager::from_config(&config, HostCapabilities::Browser)?;
//! let gate = manager.permission_gate();
//! if gate.has_permission(Role::Verified) {
//!     println!("{}", manager.display_info().nickname);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
