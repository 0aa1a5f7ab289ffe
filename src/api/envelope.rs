use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Business code the backend uses for success.
pub const SUCCESS_CODE: i64 = 200;

/// Uniform response envelope returned by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T = serde_json::Value> {
    pub code: i64,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiEnvelope<serde_json::Value> {
    /// Unwrap the envelope: success yields `data` (absent or `null` as
    /// `None`), anything else becomes a business error carrying `message`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<Option<T>, ApiError> {
        if self.code != SUCCESS_CODE {
            return Err(ApiError::Business {
                code: self.code,
                message: self
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Request failed".to_string()),
            });
        }
        match self.data {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::Decode(e.to_string())),
        }
    }
}
