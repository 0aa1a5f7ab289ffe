//! Session lifecycle: login, status checks, refresh and logout.
//!
//! [`SessionManager`] is the single owner of the process-wide session. It
//! coordinates the credential provider, the backend auth client and the
//! session store, and serializes the network-bound operations so that two
//! call sites never spend the same one-time code or rotate the token twice.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bon::Builder;
use chrono::{Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::client::{AuthClient, ExchangeRequest, HttpAuthClient};
use super::credential::{Credential, CredentialProvider};
use super::error::AuthError;
use super::permission::PermissionGate;
use super::platform::{self, HostCapabilities};
use super::session::{DisplayInfo, LoginResult, Profile, Role, Session, SessionState, LOGGED_OUT_LEVEL};
use super::store::{FileSessionStore, SessionStore, SessionStoreConfig};
use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::HerizonError;

/// Tunables for the session lifecycle.
#[derive(Debug, Clone, Builder)]
pub struct SessionSettings {
    /// A session whose expiry falls inside this window is refreshed by
    /// [`SessionManager::check_status`].
    #[builder(default = Duration::hours(24))]
    pub refresh_window: Duration,
    /// Lifetime assumed for a refreshed token; the refresh endpoint
    /// returns no expiry of its own.
    #[builder(default = Duration::days(7))]
    pub token_lifetime: Duration,
    /// `registerSource` override. Defaults to the provider's platform tag.
    pub register_source: Option<u8>,
    /// Serialized questionnaire forwarded with every exchange.
    #[builder(into)]
    pub questionnaire: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SessionSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            refresh_window: Duration::hours(config.refresh_window_hours),
            token_lifetime: Duration::hours(config.token_lifetime_hours),
            register_source: config.register_source,
            questionnaire: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationKind {
    Login,
    CheckStatus,
    Refresh,
}

#[derive(Debug, Clone)]
enum Settled {
    Login(LoginResult),
    Session(Session),
}

type OperationHandle = Shared<BoxFuture<'static, Result<Settled, AuthError>>>;

struct PendingOperation {
    kind: OperationKind,
    id: u64,
    handle: OperationHandle,
}

struct Inner {
    provider: Arc<dyn CredentialProvider>,
    client: Arc<dyn AuthClient>,
    store: Arc<dyn SessionStore>,
    settings: SessionSettings,
    pending: Mutex<Vec<PendingOperation>>,
    next_id: AtomicU64,
}

/// Owner of the current session.
///
/// Cloning is cheap; clones share the session and the in-flight guard.
/// Login, status check and refresh never overlap. Unsettled operations form
/// a queue holding at most one entry per kind. A caller whose kind is already
/// queued or running joins that entry and receives its outcome; any other
/// caller is appended and runs once everything ahead of it has settled.
///
/// # Example
/// ```no_run
/// use herizon_session::auth::{HostCapabilities, SessionManager};
/// use herizon_session::config::ClientConfig;
///
/// # async fn example() -> herizon_session::error::Result<()> {
/// let manager = SessionManager::from_config(&ClientConfig::load()?, HostCapabilities::Browser)?;
/// match manager.check_status().await {
///     Ok(profile) => println!("logged in as {:?}", profile.display_name()),
///     Err(err) => println!("{}", err.user_message()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("platform", &self.inner.provider.platform())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn CredentialProvider>,
        client: Arc<dyn AuthClient>,
        store: Arc<dyn SessionStore>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                client,
                store,
                settings,
                pending: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Wire up the file store, HTTP client and the provider matching
    /// `capabilities`.
    pub fn from_config(config: &ClientConfig, capabilities: HostCapabilities) -> Result<Self, HerizonError> {
        let store: Arc<dyn SessionStore> = Arc::new(match &config.storage_dir {
            Some(dir) => FileSessionStore::new(SessionStoreConfig::new(dir.clone())),
            None => FileSessionStore::new_default(),
        });
        let api = ApiClient::new(config)?.with_identity_source(store.clone());
        let provider = platform::detect(capabilities, config.credential_timeout());
        Ok(Self::new(
            provider,
            Arc::new(HttpAuthClient::new(api)),
            store,
            SessionSettings::from_config(config),
        ))
    }

    pub fn provider(&self) -> &Arc<dyn CredentialProvider> {
        &self.inner.provider
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    /// Permission gate reading this manager's session.
    pub fn permission_gate(&self) -> PermissionGate {
        PermissionGate::new(self.inner.store.clone())
    }

    /// Exchange `credential` for a session and store it.
    ///
    /// A rejected credential is not retried; acquire a fresh one.
    pub async fn login(&self, credential: Credential) -> Result<LoginResult, AuthError> {
        let settled = self
            .single_flight(OperationKind::Login, move |inner| async move {
                inner.login(credential).await.map(Settled::Login)
            })
            .await?;
        expect_login(settled)
    }

    /// Acquire a credential from the platform, then log in with it.
    pub async fn login_with_platform(&self, want_profile_hints: bool) -> Result<LoginResult, AuthError> {
        let settled = self
            .single_flight(OperationKind::Login, move |inner| async move {
                let credential = inner.provider.acquire(want_profile_hints).await?;
                inner.login(credential).await.map(Settled::Login)
            })
            .await?;
        expect_login(settled)
    }

    /// Confirm the stored session is still usable and return its profile.
    ///
    /// Refreshes the token first when it is close to expiry; a failed
    /// refresh is logged and the check continues with the current token.
    /// A dead platform session or a server-rejected token clears the local
    /// session. Transport failures leave it in place.
    pub async fn check_status(&self) -> Result<Profile, AuthError> {
        let settled = self
            .single_flight(OperationKind::CheckStatus, |inner| async move {
                inner.check_status().await.map(Settled::Session)
            })
            .await?;
        expect_session(settled).map(|session| session.profile)
    }

    /// Replace the stored token with a freshly issued one.
    pub async fn refresh(&self) -> Result<Session, AuthError> {
        let settled = self
            .single_flight(OperationKind::Refresh, |inner| async move {
                let session = inner.store.load().ok_or(AuthError::NoLocalSession)?;
                inner.refresh(session).await.map(Settled::Session)
            })
            .await?;
        expect_session(settled)
    }

    /// Restore or establish a session without user interaction where the
    /// platform allows it.
    ///
    /// With `force_credential_login` the status check is skipped. Otherwise
    /// a failed check falls back to a platform login when that login is
    /// silent; on other platforms the failure is returned so the caller can
    /// ask the user to log in.
    pub async fn auto_login(&self, force_credential_login: bool) -> Result<Session, AuthError> {
        if force_credential_login {
            debug!("forced credential login");
            return self.login_with_platform(false).await.map(|result| result.session);
        }

        match self.check_status().await {
            Ok(_) => self.current_session().ok_or(AuthError::NoLocalSession),
            Err(err) if self.inner.provider.supports_silent_login() => {
                info!(error = %err, "status check failed, falling back to silent login");
                self.login_with_platform(false).await.map(|result| result.session)
            }
            Err(err) => {
                debug!(error = %err, "status check failed, user action required");
                Err(err)
            }
        }
    }

    /// Drop the local session. Never fails.
    pub fn logout(&self) {
        self.inner.store.clear();
        info!("logged out");
    }

    pub fn state(&self) -> SessionState {
        match self.inner.store.load() {
            Some(session) => SessionState::LoggedIn(session),
            None => SessionState::LoggedOut,
        }
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.store.load()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.store.load().is_some()
    }

    pub fn current_role(&self) -> Option<Role> {
        self.inner.store.load().map(|session| session.role())
    }

    /// Role level, `-1` when logged out.
    pub fn role_level(&self) -> i32 {
        self.current_role().map(Role::level).unwrap_or(LOGGED_OUT_LEVEL)
    }

    /// Replace the stored profile, keeping the token.
    pub fn update_profile(&self, profile: Profile) -> Result<(), AuthError> {
        self.inner.store.save_profile(&profile)?;
        debug!(user_id = ?profile.identity(), "profile updated");
        Ok(())
    }

    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo::for_session(self.inner.store.load().as_ref())
    }

    async fn single_flight<F, Fut>(&self, kind: OperationKind, start: F) -> Result<Settled, AuthError>
    where
        F: FnOnce(Arc<Inner>) -> Fut,
        Fut: Future<Output = Result<Settled, AuthError>> + Send + 'static,
    {
        let (id, handle) = {
            let mut queue = self.inner.lock_pending();
            queue.retain(|pending| pending.handle.peek().is_none());
            if let Some(pending) = queue.iter().find(|pending| pending.kind == kind) {
                debug!(?kind, "joining pending session operation");
                (pending.id, pending.handle.clone())
            } else {
                let prior = queue.last().map(|pending| pending.handle.clone());
                if prior.is_some() {
                    debug!(?kind, queued = queue.len(), "queued behind pending session operations");
                }
                let work = start(self.inner.clone());
                let handle = async move {
                    if let Some(prior) = prior {
                        let _ = prior.await;
                    }
                    work.await
                }
                .boxed()
                .shared();
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                queue.push(PendingOperation {
                    kind,
                    id,
                    handle: handle.clone(),
                });
                (id, handle)
            }
        };

        let outcome = handle.await;
        self.inner.settle(id);
        outcome
    }
}

fn expect_login(settled: Settled) -> Result<LoginResult, AuthError> {
    match settled {
        Settled::Login(result) => Ok(result),
        Settled::Session(_) => Err(AuthError::MalformedResponse(
            "login settled without a login result".to_string(),
        )),
    }
}

fn expect_session(settled: Settled) -> Result<Session, AuthError> {
    match settled {
        Settled::Session(session) => Ok(session),
        Settled::Login(result) => Ok(result.session),
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, Vec<PendingOperation>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn settle(&self, id: u64) {
        self.lock_pending().retain(|pending| pending.id != id);
    }

    fn register_source(&self) -> u8 {
        self.settings
            .register_source
            .unwrap_or_else(|| self.provider.platform().register_source())
    }

    async fn login(&self, credential: Credential) -> Result<LoginResult, AuthError> {
        let platform = self.provider.platform();
        info!(%platform, "login started");

        let mut request = ExchangeRequest::new(credential, self.register_source());
        if let Some(questionnaire) = &self.settings.questionnaire {
            request = request.with_questionnaire(questionnaire.clone());
        }

        let result = self
            .client
            .exchange(&request)
            .await
            .inspect_err(|err| warn!(error = %err, %platform, "login failed"))?;
        self.store.save(&result.session)?;
        info!(
            user_id = ?result.session.profile.identity(),
            role = %result.session.role(),
            is_new_user = result.is_new_user,
            "login succeeded"
        );
        Ok(result)
    }

    async fn check_status(&self) -> Result<Session, AuthError> {
        let mut session = self.store.load().ok_or(AuthError::NoLocalSession)?;

        if session.needs_refresh(Utc::now(), self.settings.refresh_window) {
            debug!(expires_at = ?session.expires_at, "session close to expiry, refreshing");
            match self.refresh(session.clone()).await {
                Ok(refreshed) => session = refreshed,
                Err(err) => warn!(error = %err, "refresh failed, continuing with current token"),
            }
        }

        if self.provider.platform_session_alive().await == Some(false) {
            self.store.clear();
            info!("platform session expired, local session cleared");
            return Err(AuthError::PlatformSessionExpired);
        }

        match self.client.validate(&session.token).await {
            Ok(()) => {
                debug!(user_id = ?session.profile.identity(), "session validated");
                Ok(session)
            }
            Err(err) => {
                self.store.clear();
                warn!(error = %err, "session validation failed, local session cleared");
                let message = match err {
                    AuthError::InvalidToken(message) | AuthError::ServerRejected(message) => message,
                    other => other.to_string(),
                };
                Err(AuthError::ServerRejected(message))
            }
        }
    }

    async fn refresh(&self, session: Session) -> Result<Session, AuthError> {
        let token = self.client.refresh(&session.token).await.map_err(|err| match err {
            AuthError::RefreshFailed(_) => err,
            other => AuthError::RefreshFailed(other.to_string()),
        })?;
        if token.is_empty() || token == session.token {
            return Err(AuthError::RefreshFailed(
                "server did not issue a new token".to_string(),
            ));
        }

        if self.store.load().map(|current| current.token) != Some(session.token.clone()) {
            return Err(AuthError::RefreshFailed(
                "session changed while refreshing".to_string(),
            ));
        }

        let refreshed = Session {
            token,
            expires_at: Some(Utc::now() + self.settings.token_lifetime),
            profile: session.profile,
        };
        if let Err(err) = self.store.save(&refreshed) {
            warn!(error = %err, "could not persist refreshed token");
        }
        info!(expires_at = ?refreshed.expires_at, "token refreshed");
        Ok(refreshed)
    }
}
