use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::AuthError;
use super::session::{Profile, Session};

/// Storage abstraction for the single process-wide session slot.
///
/// `load` never fails: unreadable or partial storage reads as "no session".
/// Every `load` also repairs legacy profiles that carry only one of
/// `id` / `userId` and writes the repaired record back before returning.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session) -> Result<(), AuthError>;
    /// Replace the profile of the stored session, keeping its token.
    fn save_profile(&self, profile: &Profile) -> Result<(), AuthError>;
    fn clear(&self);

    /// Account id for the identity header, if a session is stored.
    fn identity(&self) -> Option<i64> {
        self.load().and_then(|session| session.profile.identity())
    }
}

/// Raw persisted record. Keys match what the app has always written:
/// `token`, `userInfo`, `tokenExpiration` (epoch millis).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "userInfo", default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<serde_json::Value>,
    #[serde(rename = "tokenExpiration", default, skip_serializing_if = "Option::is_none")]
    pub token_expiration: Option<i64>,
}

impl StoredRecord {
    pub fn from_session(session: &Session) -> Result<Self, AuthError> {
        let mut profile = session.profile.clone();
        profile.normalize();
        Ok(Self {
            token: Some(session.token.clone()),
            user_info: Some(serde_json::to_value(&profile)?),
            token_expiration: session.expires_at.map(|at| at.timestamp_millis()),
        })
    }

    /// Repair the `id` / `userId` pair in place. Returns `true` if changed.
    pub fn normalize(&mut self) -> bool {
        let Some(serde_json::Value::Object(info)) = self.user_info.as_mut() else {
            return false;
        };
        let id = info.get("id").filter(|v| !is_blank(v)).cloned();
        let user_id = info.get("userId").filter(|v| !is_blank(v)).cloned();
        match (id, user_id) {
            (Some(id), None) => {
                info.insert("userId".to_string(), id);
                true
            }
            (None, Some(user_id)) => {
                info.insert("id".to_string(), user_id);
                true
            }
            _ => false,
        }
    }

    /// Decode into a session. Partial records (token without profile or the
    /// reverse) and undecodable profiles yield `None`.
    pub fn to_session(&self) -> Option<Session> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        let info = self.user_info.clone()?;
        let profile: Profile = match serde_json::from_value(info) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "stored profile is unreadable; treating as logged out");
                return None;
            }
        };
        Some(Session {
            token: token.to_string(),
            expires_at: self
                .token_expiration
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            profile,
        })
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<StoredRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary raw record, e.g. one written by an older build.
    pub fn with_record(record: StoredRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// Snapshot of the raw record as currently stored.
    pub fn record(&self) -> StoredRecord {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoredRecord> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        let mut record = self.lock();
        if record.normalize() {
            debug!("repaired stored profile id keys");
        }
        record.to_session()
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        *self.lock() = StoredRecord::from_session(session)?;
        Ok(())
    }

    fn save_profile(&self, profile: &Profile) -> Result<(), AuthError> {
        let mut record = self.lock();
        if record.token.is_none() {
            return Err(AuthError::NoLocalSession);
        }
        let mut profile = profile.clone();
        profile.normalize();
        record.user_info = Some(serde_json::to_value(&profile)?);
        Ok(())
    }

    fn clear(&self) {
        *self.lock() = StoredRecord::default();
    }
}

/// Configuration for file-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub base_dir: PathBuf,
}

impl SessionStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_herizon_dir()
    }
}

/// File-backed session store: one JSON document, written atomically with
/// owner-only permissions.
///
/// # Example
/// ```no_run
/// use herizon_session::auth::{FileSessionStore, SessionStore};
///
/// let store = FileSessionStore::new_default();
/// if let Some(session) = store.load() {
///     println!("logged in as {:?}", session.profile.nickname);
/// }
/// ```
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-repair-write against concurrent saves in this process.
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            path: config.base_dir.join("session.json"),
            guard: Mutex::new(()),
        }
    }

    pub fn new_default() -> Self {
        Self::new(SessionStoreConfig::new(default_herizon_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Option<StoredRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "session file unreadable");
                return None;
            }
        };
        match serde_json::from_str::<StoredRecord>(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "session file corrupt; treating as logged out");
                None
            }
        }
    }

    /// Staging file next to `session.json`; renamed over it once fully written.
    fn staging_path(&self) -> PathBuf {
        self.path.with_extension(format!("json.{}.tmp", std::process::id()))
    }

    fn write_record(&self, record: &StoredRecord) -> Result<(), AuthError> {
        let serialized = serde_json::to_vec_pretty(record)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let staging = self.staging_path();
        let persisted = write_owner_only(&staging, &serialized).and_then(|()| fs::rename(&staging, &self.path));
        if let Err(err) = persisted {
            let _ = fs::remove_file(&staging);
            warn!(error = %err, path = %self.path.display(), "failed to persist session");
            return Err(err.into());
        }
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let _guard = self.lock();
        let mut record = self.read_record()?;
        if record.normalize() {
            debug!(path = %self.path.display(), "repaired stored profile id keys");
            if let Err(err) = self.write_record(&record) {
                warn!(error = %err, "failed to rewrite repaired session record");
            }
        }
        record.to_session()
    }

    fn save(&self, session: &Session) -> Result<(), AuthError> {
        let _guard = self.lock();
        self.write_record(&StoredRecord::from_session(session)?)
    }

    fn save_profile(&self, profile: &Profile) -> Result<(), AuthError> {
        let _guard = self.lock();
        let mut record = self
            .read_record()
            .filter(|r| r.token.is_some())
            .ok_or(AuthError::NoLocalSession)?;
        let mut profile = profile.clone();
        profile.normalize();
        record.user_info = Some(serde_json::to_value(&profile)?);
        self.write_record(&record)
    }

    fn clear(&self) {
        let _guard = self.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(error = %err, path = %self.path.display(), "failed to remove session file"),
        }
    }
}

pub(crate) fn default_herizon_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".herizon"))
        .unwrap_or_else(|| PathBuf::from(".herizon"))
}

fn write_owner_only(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover staging file keeps its old bits.
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::Role;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileSessionStore) {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(SessionStoreConfig::new(dir.path().to_path_buf()));
        (dir, store)
    }

    fn profile_with_id(id: i64) -> Profile {
        let mut profile = Profile::new(Role::Verified);
        profile.id = Some(id);
        profile
    }

    #[test]
    fn session_round_trip_works() {
        let (_dir, store) = temp_store();
        let expires = DateTime::<Utc>::from_timestamp_millis(1_900_000_000_000).unwrap();
        let session = Session::new("tok", profile_with_id(7)).with_expires_at(expires);
        store.save(&session).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.token, "tok");
        assert_eq!(loaded.expires_at, Some(expires));
        assert_eq!(loaded.profile.id, Some(7));
        assert_eq!(loaded.profile.user_id, Some(7));
    }

    #[test]
    fn clear_removes_session() {
        let (_dir, store) = temp_store();
        store.save(&Session::new("tok", profile_with_id(1))).unwrap();
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn normalize_treats_null_and_empty_as_missing() {
        let mut record = StoredRecord {
            token: Some("t".to_string()),
            user_info: Some(json!({"id": null, "userId": 4, "role": 0})),
            token_expiration: None,
        };
        assert!(record.normalize());
        assert_eq!(record.user_info.as_ref().unwrap()["id"], json!(4));

        let mut record = StoredRecord {
            token: Some("t".to_string()),
            user_info: Some(json!({"id": 8, "userId": "", "role": 0})),
            token_expiration: None,
        };
        assert!(record.normalize());
        assert_eq!(record.user_info.as_ref().unwrap()["userId"], json!(8));
    }

    #[test]
    fn partial_records_are_not_sessions() {
        let token_only = StoredRecord {
            token: Some("t".to_string()),
            ..StoredRecord::default()
        };
        assert!(token_only.to_session().is_none());
        let profile_only = StoredRecord {
            user_info: Some(json!({"id": 1, "role": 1})),
            ..StoredRecord::default()
        };
        assert!(profile_only.to_session().is_none());
    }

    #[test]
    fn leftover_staging_file_is_replaced_and_not_left_behind() {
        let (dir, store) = temp_store();
        fs::write(store.staging_path(), b"stale half-written record").unwrap();

        store.save(&Session::new("tok", profile_with_id(3))).unwrap();

        assert_eq!(store.load().unwrap().token, "tok");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_stays_owner_only_when_staging_file_was_world_readable() {
        let (_dir, store) = temp_store();
        fs::write(store.staging_path(), b"").unwrap();
        fs::set_permissions(store.staging_path(), fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&Session::new("tok", profile_with_id(3))).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_save_profile_requires_session() {
        let store = MemorySessionStore::new();
        let err = store.save_profile(&profile_with_id(2)).unwrap_err();
        assert_eq!(err, AuthError::NoLocalSession);
    }
}
