//! Role-based guards for protected actions.

use std::sync::Arc;

use bon::Builder;
use tracing::debug;

use super::session::{Role, LOGGED_OUT_LEVEL};
use super::store::SessionStore;

/// UI effects the gate asks the host application to perform.
pub trait Prompter: Send + Sync {
    /// Tell the user they must log in.
    fn login_required(&self, message: &str);
    /// Route to the login screen.
    fn navigate_to_login(&self);
    /// Tell the user their role is too low.
    fn permission_denied(&self, message: &str);
    /// Offer a trial user the upgrade to a verified account.
    fn trial_upgrade(&self);
}

/// Prompt texts and behavior for [`PermissionGate::verify_and_execute`].
#[derive(Debug, Clone, Builder)]
pub struct GateOptions {
    #[builder(into, default = "Please log in first".to_string())]
    pub login_prompt: String,
    #[builder(into, default = "Insufficient permissions".to_string())]
    pub permission_prompt: String,
    #[builder(default = true)]
    pub show_trial_upgrade: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Result of a guarded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<T> {
    Executed(T),
    LoginRequired,
    UpgradeSuggested,
    Denied,
}

impl<T> GateOutcome<T> {
    pub fn executed(self) -> Option<T> {
        match self {
            Self::Executed(value) => Some(value),
            _ => None,
        }
    }
}

/// Whether `current` (`None` when logged out) meets `required`.
pub fn role_satisfies(current: Option<Role>, required: Role) -> bool {
    current.map(Role::level).unwrap_or(LOGGED_OUT_LEVEL) >= required.level()
}

/// Checks the current session's role against requirements. Reads the
/// session, never changes it.
#[derive(Clone)]
pub struct PermissionGate {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}

impl PermissionGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    fn current_role(&self) -> Option<Role> {
        self.store.load().map(|session| session.role())
    }

    pub fn has_permission(&self, required: Role) -> bool {
        role_satisfies(self.current_role(), required)
    }

    /// Run `action` if the current role meets `required`, otherwise emit the
    /// matching prompt. `action` runs at most once.
    pub fn verify_and_execute<T>(
        &self,
        required: Role,
        prompter: &dyn Prompter,
        options: &GateOptions,
        action: impl FnOnce() -> T,
    ) -> GateOutcome<T> {
        let Some(role) = self.current_role() else {
            debug!(%required, "gate: not logged in");
            prompter.login_required(&options.login_prompt);
            prompter.navigate_to_login();
            return GateOutcome::LoginRequired;
        };

        if role_satisfies(Some(role), required) {
            return GateOutcome::Executed(action());
        }

        debug!(%role, %required, "gate: role too low");
        if role == Role::Trial && options.show_trial_upgrade {
            prompter.trial_upgrade();
            GateOutcome::UpgradeSuggested
        } else {
            prompter.permission_denied(&options.permission_prompt);
            GateOutcome::Denied
        }
    }

    /// Call `on_ok` when the role meets `required`, else `on_denied`.
    pub fn require_permission<T>(
        &self,
        required: Role,
        on_ok: impl FnOnce() -> T,
        on_denied: impl FnOnce() -> T,
    ) -> T {
        if self.has_permission(required) {
            on_ok()
        } else {
            on_denied()
        }
    }

    pub fn require_login<T>(&self, on_ok: impl FnOnce() -> T, on_denied: impl FnOnce() -> T) -> T {
        self.require_permission(Role::Trial, on_ok, on_denied)
    }

    pub fn is_trial_user(&self) -> bool {
        self.current_role() == Some(Role::Trial)
    }

    /// Verified users and administrators.
    pub fn is_verified_user(&self) -> bool {
        self.has_permission(Role::Verified)
    }

    pub fn is_admin(&self) -> bool {
        self.current_role() == Some(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_out_satisfies_nothing() {
        for required in [Role::Trial, Role::Verified, Role::Admin] {
            assert!(!role_satisfies(None, required));
        }
    }

    #[test]
    fn satisfaction_follows_role_order() {
        assert!(role_satisfies(Some(Role::Admin), Role::Verified));
        assert!(role_satisfies(Some(Role::Verified), Role::Verified));
        assert!(!role_satisfies(Some(Role::Trial), Role::Verified));
    }

    #[test]
    fn default_options() {
        let options = GateOptions::default();
        assert_eq!(options.login_prompt, "Please log in first");
        assert_eq!(options.permission_prompt, "Insufficient permissions");
        assert!(options.show_trial_upgrade);
        let custom = GateOptions::builder().permission_prompt("Admins only").build();
        assert_eq!(custom.permission_prompt, "Admins only");
        assert!(custom.show_trial_upgrade);
    }
}
