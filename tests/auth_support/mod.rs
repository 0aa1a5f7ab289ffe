#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use herizon_session::auth::{
    AuthClient, AuthError, Credential, CredentialProvider, ExchangeRequest, LoginResult,
    MemorySessionStore, Platform, Profile, Prompter, Role, Session, SessionManager,
    SessionSettings, SessionStore,
};

pub fn profile(id: i64, role: Role) -> Profile {
    let mut profile = Profile::new(role);
    profile.user_id = Some(id);
    profile.id = Some(id);
    profile.nickname = Some(format!("user-{id}"));
    profile
}

pub fn session(token: &str, role: Role) -> Session {
    Session::new(token, profile(7, role))
}

pub fn login_result(token: &str, role: Role) -> LoginResult {
    LoginResult {
        session: session(token, role),
        is_new_user: false,
        login_time: None,
    }
}

/// Scripted backend; counts every call.
pub struct FakeAuthClient {
    exchange_result: Mutex<Result<LoginResult, AuthError>>,
    validate_result: Mutex<Result<(), AuthError>>,
    refresh_result: Mutex<Result<String, AuthError>>,
    delay: Mutex<Duration>,
    pub exchange_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub exchanged: Mutex<Vec<ExchangeRequest>>,
    pub validated_tokens: Mutex<Vec<String>>,
}

impl Default for FakeAuthClient {
    fn default() -> Self {
        Self {
            exchange_result: Mutex::new(Ok(login_result("issued-token", Role::Verified))),
            validate_result: Mutex::new(Ok(())),
            refresh_result: Mutex::new(Ok("refreshed-token".to_string())),
            delay: Mutex::new(Duration::ZERO),
            exchange_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            exchanged: Mutex::new(Vec::new()),
            validated_tokens: Mutex::new(Vec::new()),
        }
    }
}

impl FakeAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exchange(self, result: Result<LoginResult, AuthError>) -> Self {
        *self.exchange_result.lock().unwrap() = result;
        self
    }

    pub fn with_validate(self, result: Result<(), AuthError>) -> Self {
        *self.validate_result.lock().unwrap() = result;
        self
    }

    pub fn with_refresh(self, result: Result<String, AuthError>) -> Self {
        *self.refresh_result.lock().unwrap() = result;
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn validate_count(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AuthClient for FakeAuthClient {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<LoginResult, AuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.exchanged.lock().unwrap().push(request.clone());
        self.pause().await;
        self.exchange_result.lock().unwrap().clone()
    }

    async fn validate(&self, token: &str) -> Result<(), AuthError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validated_tokens.lock().unwrap().push(token.to_string());
        self.pause().await;
        self.validate_result.lock().unwrap().clone()
    }

    async fn refresh(&self, _token: &str) -> Result<String, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.refresh_result.lock().unwrap().clone()
    }
}

/// Credential provider with fixed platform behavior.
pub struct FakeProvider {
    pub platform: Platform,
    pub silent: bool,
    pub session_alive: Option<bool>,
    pub acquire_result: Mutex<Result<Credential, AuthError>>,
    pub acquire_calls: AtomicUsize,
}

impl FakeProvider {
    /// Mini-program: silent login, live platform session.
    pub fn mini_program() -> Self {
        Self {
            platform: Platform::MiniProgram,
            silent: true,
            session_alive: Some(true),
            acquire_result: Mutex::new(Ok(Credential::new("platform-code"))),
            acquire_calls: AtomicUsize::new(0),
        }
    }

    pub fn browser() -> Self {
        Self {
            platform: Platform::Browser,
            silent: false,
            session_alive: None,
            acquire_result: Mutex::new(Err(AuthError::PlatformUnsupported("browser".to_string()))),
            acquire_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_session_alive(mut self, alive: Option<bool>) -> Self {
        self.session_alive = alive;
        self
    }

    pub fn acquire_count(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for FakeProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn acquire(&self, _want_profile_hints: bool) -> Result<Credential, AuthError> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        self.acquire_result.lock().unwrap().clone()
    }

    async fn supports_login(&self) -> bool {
        self.platform != Platform::Browser
    }

    fn supports_silent_login(&self) -> bool {
        self.silent
    }

    async fn platform_session_alive(&self) -> Option<bool> {
        self.session_alive
    }
}

/// Everything a test needs to drive a manager.
pub struct Harness {
    pub manager: SessionManager,
    pub client: Arc<FakeAuthClient>,
    pub provider: Arc<FakeProvider>,
    pub store: Arc<MemorySessionStore>,
}

impl Harness {
    pub fn new(provider: FakeProvider, client: FakeAuthClient) -> Self {
        Self::with_settings(provider, client, SessionSettings::default())
    }

    pub fn with_settings(provider: FakeProvider, client: FakeAuthClient, settings: SessionSettings) -> Self {
        let client = Arc::new(client);
        let provider = Arc::new(provider);
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(provider.clone(), client.clone(), store.clone(), settings);
        Self {
            manager,
            client,
            provider,
            store,
        }
    }

    pub fn seed(&self, session: &Session) {
        self.store.save(session).unwrap();
    }
}

/// Records prompter calls in order.
#[derive(Default)]
pub struct RecordingPrompter {
    events: Mutex<Vec<String>>,
}

impl RecordingPrompter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Prompter for RecordingPrompter {
    fn login_required(&self, message: &str) {
        self.push(format!("login_required:{message}"));
    }

    fn navigate_to_login(&self) {
        self.push("navigate_to_login".to_string());
    }

    fn permission_denied(&self, message: &str) {
        self.push(format!("permission_denied:{message}"));
    }

    fn trial_upgrade(&self) {
        self.push("trial_upgrade".to_string());
    }
}
