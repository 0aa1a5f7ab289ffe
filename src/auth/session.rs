use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Permission tier. Higher tiers hold every permission of lower ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(try_from = "i64", into = "i64")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Trial = 0,
    Verified = 1,
    Admin = 2,
}

impl Role {
    /// Integer level used on the wire; a logged-out user is `-1`.
    pub fn level(self) -> i32 {
        self as i32
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Trial => "Trial user",
            Self::Verified => "Verified user",
            Self::Admin => "Administrator",
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Trial),
            1 => Ok(Self::Verified),
            2 => Ok(Self::Admin),
            other => Err(format!("unknown role {other}")),
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role as i64
    }
}

/// Level reported for a visitor without a session.
pub const LOGGED_OUT_LEVEL: i32 = -1;

/// User profile as returned by the backend (`userInfo`).
///
/// Legacy records may carry only one of `id` / `userId`; both name the same
/// account. Fields this crate does not interpret are kept in `extra` so they
/// survive a save/load cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_desc: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    pub fn new(role: Role) -> Self {
        Self {
            id: None,
            user_id: None,
            username: None,
            nickname: None,
            avatar: None,
            role,
            role_desc: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Fill whichever of `id` / `userId` is missing from the other.
    /// Returns `true` when the profile changed.
    pub fn normalize(&mut self) -> bool {
        match (self.id, self.user_id) {
            (Some(id), None) => {
                self.user_id = Some(id);
                true
            }
            (None, Some(user_id)) => {
                self.id = Some(user_id);
                true
            }
            _ => false,
        }
    }

    /// Account id used for the identity header.
    pub fn identity(&self) -> Option<i64> {
        self.user_id.or(self.id)
    }

    /// Name to show for this user.
    pub fn display_name(&self) -> Option<&str> {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.username.as_deref())
    }
}

/// The authenticated state of the current user.
///
/// A session always carries both a token and a profile; there is no partial
/// session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    /// After this instant the token must not be used for new requests.
    pub expires_at: Option<DateTime<Utc>>,
    pub profile: Profile,
}

impl Session {
    pub fn new(token: impl Into<String>, profile: Profile) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
            profile,
        }
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Whether `now` falls inside the pre-expiry `window`.
    /// Sessions without an expiry never need a refresh.
    pub fn needs_refresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.expires_at
            .map(|expires_at| now > expires_at - window)
            .unwrap_or(false)
    }
}

/// Successful login-code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResult {
    pub session: Session,
    pub is_new_user: bool,
    pub login_time: Option<DateTime<Utc>>,
}

/// Externally observable lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(Session),
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

/// What a UI shows for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub nickname: String,
    pub role: i32,
    pub role_desc: String,
}

impl DisplayInfo {
    pub fn for_session(session: Option<&Session>) -> Self {
        match session {
            None => Self {
                nickname: "Not logged in".to_string(),
                role: LOGGED_OUT_LEVEL,
                role_desc: "Guest".to_string(),
            },
            Some(session) => Self {
                nickname: session.profile.display_name().unwrap_or_default().to_string(),
                role: session.role().level(),
                role_desc: session.role().description().to_string(),
            },
        }
    }
}
