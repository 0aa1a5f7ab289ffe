//! Client configuration (layered: defaults < config file < environment).

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::HerizonError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variables read by [`ClientConfig::apply_env`].
pub const ENV_VARS: [&str; 4] = [
    "HERIZON_BASE_URL",
    "HERIZON_STORAGE_DIR",
    "HERIZON_REQUEST_TIMEOUT_MS",
    "HERIZON_REGISTER_SOURCE",
];

/// Settings for the API transport and the session lifecycle.
///
/// # Example
/// ```
/// use herizon_session::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://api.example.com/api")
///     .build();
/// assert_eq!(config.request_timeout_ms, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; endpoint paths such as `/auth/wechat-login` are appended.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = 10_000)]
    pub request_timeout_ms: u64,
    /// Upper bound on platform credential acquisition.
    #[builder(default = 10_000)]
    pub credential_timeout_ms: u64,
    #[builder(default = 24)]
    pub refresh_window_hours: i64,
    /// Lifetime assumed for refreshed tokens.
    #[builder(default = 168)]
    pub token_lifetime_hours: i64,
    /// `registerSource` override; the platform's tag is used otherwise.
    pub register_source: Option<u8>,
    /// Session file directory; `~/.herizon` when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Defaults, then `~/.herizon/config.toml` when present, then the
    /// environment (including a `.env` file).
    pub fn load() -> Result<Self, HerizonError> {
        let _ = dotenvy::dotenv();
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults overridden by the environment only.
    pub fn from_env() -> Result<Self, HerizonError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, HerizonError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, HerizonError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".herizon").join(CONFIG_FILE_NAME))
    }

    pub fn apply_env(&mut self) -> Result<(), HerizonError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`; empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), HerizonError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("HERIZON_BASE_URL") {
            self.base_url = url;
        }
        if let Some(dir) = get("HERIZON_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = get("HERIZON_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_var("HERIZON_REQUEST_TIMEOUT_MS", &ms)?;
        }
        if let Some(source) = get("HERIZON_REGISTER_SOURCE") {
            self.register_source = Some(parse_var("HERIZON_REGISTER_SOURCE", &source)?);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn credential_timeout(&self) -> Duration {
        Duration::from_millis(self.credential_timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, HerizonError> {
    value
        .parse()
        .map_err(|_| HerizonError::Configuration(format!("{key}: invalid value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("HERIZON_BASE_URL", "https://api.test/api"),
            ("HERIZON_STORAGE_DIR", "/var/lib/herizon"),
            ("HERIZON_REQUEST_TIMEOUT_MS", "2500"),
            ("HERIZON_REGISTER_SOURCE", " "),
        ]
        .into_iter()
        .collect();
        let mut config = ClientConfig::default();
        config
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "https://api.test/api");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/herizon")));
        assert_eq!(config.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.register_source, None);
    }

    #[test]
    fn bad_env_value_is_configuration_error() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_env_from(|key| (key == "HERIZON_REQUEST_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, HerizonError::Configuration(_)));
    }
}
