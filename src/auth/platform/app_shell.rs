use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{AppShellHost, HostFailure, OAUTH_PROVIDER};
use crate::auth::credential::{Credential, CredentialProvider, Platform};
use crate::auth::error::AuthError;

/// Generic app shell: login goes through a registered OAuth provider.
pub struct AppShellProvider {
    host: Arc<dyn AppShellHost>,
}

impl AppShellProvider {
    pub fn new(host: Arc<dyn AppShellHost>) -> Self {
        Self { host }
    }

    async fn provider_registered(&self) -> Result<bool, AuthError> {
        let providers = self.host.oauth_providers().await.map_err(map_failure)?;
        Ok(providers.iter().any(|p| p == OAUTH_PROVIDER))
    }
}

fn map_failure(failure: HostFailure) -> AuthError {
    match failure {
        HostFailure::Cancelled => AuthError::UserCancelled,
        HostFailure::Failed(message) => AuthError::PlatformError(message),
    }
}

#[async_trait]
impl CredentialProvider for AppShellProvider {
    fn platform(&self) -> Platform {
        Platform::AppShell
    }

    async fn acquire(&self, want_profile_hints: bool) -> Result<Credential, AuthError> {
        if !self.provider_registered().await? {
            return Err(AuthError::PlatformUnsupported(format!(
                "oauth provider {OAUTH_PROVIDER} is not registered"
            )));
        }

        let code = self
            .host
            .login(OAUTH_PROVIDER)
            .await
            .map_err(map_failure)
            .inspect_err(|err| warn!(error = %err, provider = OAUTH_PROVIDER, "app-shell login failed"))?;
        if code.trim().is_empty() {
            return Err(AuthError::PlatformError(
                "platform login returned no code".to_string(),
            ));
        }
        debug!(provider = OAUTH_PROVIDER, "app-shell login code acquired");

        let mut credential = Credential::new(code);
        if want_profile_hints {
            if let Some(hints) = self.host.profile_hints() {
                credential = credential.with_hints(hints);
            }
        }
        Ok(credential)
    }

    async fn supports_login(&self) -> bool {
        match self.provider_registered().await {
            Ok(registered) => registered,
            Err(err) => {
                warn!(error = %err, "could not query oauth providers");
                false
            }
        }
    }
}
