//! Request/response bindings for the backend auth endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credential::Credential;
use super::error::AuthError;
use super::session::{LoginResult, Profile, Session};
use crate::api::{ApiClient, ApiError, RequestOptions};

const EXCHANGE_PATH: &str = "/auth/wechat-login";
const VALIDATE_PATH: &str = "/auth/validate-token";
const REFRESH_PATH: &str = "/auth/refresh-token";
const CURRENT_USER_PATH: &str = "/auth/current-user";
const CONFIG_STATUS_PATH: &str = "/auth/wechat-config-status";

/// Everything the backend needs to trade a credential for a session.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    pub credential: Credential,
    pub register_source: u8,
    /// Serialized identity questionnaire, forwarded verbatim.
    pub questionnaire: Option<String>,
}

impl ExchangeRequest {
    pub fn new(credential: Credential, register_source: u8) -> Self {
        Self {
            credential,
            register_source,
            questionnaire: None,
        }
    }

    pub fn with_questionnaire(mut self, questionnaire: impl Into<String>) -> Self {
        self.questionnaire = Some(questionnaire.into());
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeBody<'a> {
    code: &'a str,
    nickname: &'a str,
    avatar: &'a str,
    register_source: u8,
    questionnaire_data: &'a str,
}

impl<'a> From<&'a ExchangeRequest> for ExchangeBody<'a> {
    fn from(request: &'a ExchangeRequest) -> Self {
        Self {
            code: &request.credential.code,
            nickname: request.credential.nickname.as_deref().unwrap_or(""),
            avatar: request.credential.avatar.as_deref().unwrap_or(""),
            register_source: request.register_source,
            questionnaire_data: request.questionnaire.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResponse {
    token: Option<String>,
    user_info: Option<serde_json::Value>,
    is_new_user: Option<bool>,
    token_expiration: Option<i64>,
    login_time: Option<i64>,
}

impl ExchangeResponse {
    fn into_login_result(self) -> Result<LoginResult, AuthError> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("login response has no token".to_string()))?;
        let info = self
            .user_info
            .filter(|v| !v.is_null())
            .ok_or_else(|| AuthError::MalformedResponse("login response has no userInfo".to_string()))?;
        let mut profile: Profile = serde_json::from_value(info)
            .map_err(|e| AuthError::MalformedResponse(format!("userInfo: {e}")))?;
        profile.normalize();

        Ok(LoginResult {
            session: Session {
                token,
                expires_at: self
                    .token_expiration
                    .and_then(DateTime::<Utc>::from_timestamp_millis),
                profile,
            },
            is_new_user: self.is_new_user.unwrap_or(false),
            login_time: self.login_time.and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }
}

/// Backend auth operations. Each is a single request/response pair; none
/// retries and none touches local state.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Trade a one-time credential for a session.
    async fn exchange(&self, request: &ExchangeRequest) -> Result<LoginResult, AuthError>;

    /// Check a token server-side. Side-effect free.
    async fn validate(&self, token: &str) -> Result<(), AuthError>;

    /// Obtain a replacement token. Never returns `token` itself.
    async fn refresh(&self, token: &str) -> Result<String, AuthError>;
}

/// [`AuthClient`] over the backend HTTP API.
///
/// # Example
/// ```no_run
/// use herizon_session::api::ApiClient;
/// use herizon_session::auth::{AuthClient, HttpAuthClient};
/// use herizon_session::config::ClientConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpAuthClient::new(ApiClient::new(&ClientConfig::default())?);
/// client.validate("token").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    api: ApiClient,
}

impl HttpAuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Profile of the user owning `token`, as the server sees it now.
    pub async fn current_user(&self, token: &str) -> Result<Profile, AuthError> {
        let profile: Option<Profile> = self
            .api
            .get(CURRENT_USER_PATH, RequestOptions::bearer(token))
            .await
            .map_err(map_token_failure)?;
        let mut profile = profile
            .ok_or_else(|| AuthError::MalformedResponse("current user response is empty".to_string()))?;
        profile.normalize();
        Ok(profile)
    }

    /// Human-readable status of the backend's platform-login configuration.
    pub async fn config_status(&self) -> Result<String, AuthError> {
        let status: Option<String> = self
            .api
            .get(CONFIG_STATUS_PATH, RequestOptions::default())
            .await
            .map_err(|err| match err {
                ApiError::Transport(message) => AuthError::Network(message),
                ApiError::Decode(message) => AuthError::MalformedResponse(message),
                other => AuthError::ServerRejected(other.message().to_string()),
            })?;
        Ok(status.unwrap_or_default())
    }
}

fn map_token_failure(error: ApiError) -> AuthError {
    match error {
        ApiError::Transport(message) => AuthError::Network(message),
        other => AuthError::InvalidToken(other.message().to_string()),
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<LoginResult, AuthError> {
        if request.credential.code.trim().is_empty() {
            return Err(AuthError::PlatformError("credential has no code".to_string()));
        }
        let body = serde_json::to_value(ExchangeBody::from(request))?;
        let response: Option<ExchangeResponse> = self
            .api
            .post(EXCHANGE_PATH, RequestOptions::json(body))
            .await
            .map_err(AuthError::from_exchange_failure)?;
        let result = response
            .ok_or_else(|| AuthError::MalformedResponse("login response is empty".to_string()))?
            .into_login_result()?;
        debug!(
            user_id = ?result.session.profile.identity(),
            is_new_user = result.is_new_user,
            "code exchange succeeded"
        );
        Ok(result)
    }

    async fn validate(&self, token: &str) -> Result<(), AuthError> {
        self.api
            .post::<serde_json::Value>(VALIDATE_PATH, RequestOptions::bearer(token))
            .await
            .map_err(map_token_failure)?;
        Ok(())
    }

    async fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let refreshed: Option<String> = self
            .api
            .post(REFRESH_PATH, RequestOptions::bearer(token))
            .await
            .map_err(|err| AuthError::RefreshFailed(err.message().to_string()))?;
        match refreshed {
            Some(new_token) if !new_token.is_empty() && new_token != token => Ok(new_token),
            Some(_) => Err(AuthError::RefreshFailed(
                "server returned the previous token".to_string(),
            )),
            None => Err(AuthError::RefreshFailed("server returned no token".to_string())),
        }
    }
}
