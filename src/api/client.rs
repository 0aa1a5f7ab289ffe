//! Envelope-aware HTTP client shared by the auth client and business calls.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::envelope::ApiEnvelope;
use super::ApiError;
use crate::auth::store::SessionStore;
use crate::config::ClientConfig;

/// Header carrying the stored profile id on authenticated requests
/// (`userId` on the wire; header names are case-insensitive).
pub const IDENTITY_HEADER: &str = "userid";

/// Per-request extras.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer: Option<String>,
    /// JSON body for POST.
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn json(body: serde_json::Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }
}

/// HTTP client for the backend API.
///
/// When an identity source is attached, every request carries the
/// [`IDENTITY_HEADER`] derived from the stored profile; without a stored
/// profile the header is simply omitted.
///
/// # Example
/// ```no_run
/// use herizon_session::api::ApiClient;
/// use herizon_session::config::ClientConfig;
///
/// let client = ApiClient::new(&ClientConfig::default())?;
/// # Ok::<(), herizon_session::api::ApiError>(())
/// ```
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    identity: Option<Arc<dyn SessionStore>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity.as_ref().map(|_| ".."))
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: trim_base_url(&config.base_url),
            identity: None,
        })
    }

    /// Attach the session store the identity header is read from.
    pub fn with_identity_source(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.identity = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        self.send(Method::GET, path, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        self.send(Method::POST, path, options).await
    }

    /// Send one request and unwrap the response envelope. No retries.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers(options.bearer.as_deref()));
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        debug!(method = %method, path, "herizon api request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            debug!(status = status.as_u16(), path, "herizon api non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.into_data()
    }

    fn headers(&self, bearer: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = bearer {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        if let Some(id) = self.identity.as_ref().and_then(|store| store.identity()) {
            if let Ok(val) = HeaderValue::from_str(&id.to_string()) {
                headers.insert(IDENTITY_HEADER, val);
            }
        }
        headers
    }
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
