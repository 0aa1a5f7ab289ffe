use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{HostFailure, MiniProgramHost};
use crate::auth::credential::{Credential, CredentialProvider, Platform};
use crate::auth::error::AuthError;

const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Embedded mini-program login: the native primitive yields a code
/// directly, and the host keeps its own session that can be probed.
pub struct MiniProgramProvider {
    host: Arc<dyn MiniProgramHost>,
    timeout: Duration,
}

impl MiniProgramProvider {
    pub fn new(host: Arc<dyn MiniProgramHost>) -> Self {
        Self {
            host,
            timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CredentialProvider for MiniProgramProvider {
    fn platform(&self) -> Platform {
        Platform::MiniProgram
    }

    async fn acquire(&self, want_profile_hints: bool) -> Result<Credential, AuthError> {
        let login = tokio::time::timeout(self.timeout, self.host.login())
            .await
            .map_err(|_| AuthError::Timeout(self.timeout.as_millis() as u64))
            .and_then(|outcome| {
                outcome.map_err(|failure| match failure {
                    HostFailure::Cancelled => AuthError::UserCancelled,
                    HostFailure::Failed(message) => AuthError::PlatformError(message),
                })
            });
        let code = login.inspect_err(|err| warn!(error = %err, "mini-program login failed"))?;

        if code.trim().is_empty() {
            return Err(AuthError::PlatformError(
                "platform login returned no code".to_string(),
            ));
        }
        debug!("mini-program login code acquired");

        let mut credential = Credential::new(code);
        if want_profile_hints {
            if let Some(hints) = self.host.profile_hints() {
                credential = credential.with_hints(hints);
            }
        }
        Ok(credential)
    }

    async fn supports_login(&self) -> bool {
        true
    }

    fn supports_silent_login(&self) -> bool {
        true
    }

    async fn platform_session_alive(&self) -> Option<bool> {
        Some(self.host.check_session().await)
    }
}
