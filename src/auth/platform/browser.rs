use async_trait::async_trait;

use crate::auth::credential::{Credential, CredentialProvider, Platform};
use crate::auth::error::AuthError;

/// Web browser: platform login is not available.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserProvider;

#[async_trait]
impl CredentialProvider for BrowserProvider {
    fn platform(&self) -> Platform {
        Platform::Browser
    }

    async fn acquire(&self, _want_profile_hints: bool) -> Result<Credential, AuthError> {
        Err(AuthError::PlatformUnsupported(
            "platform login is not available in a browser".to_string(),
        ))
    }

    async fn supports_login(&self) -> bool {
        false
    }
}
