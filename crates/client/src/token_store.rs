use common::{ApiResult, Clock};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Storage keys, kept wire-compatible with the browser deployment so a
/// migrated session file reads back cleanly.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const TOKEN_TIMESTAMP: &str = "token_timestamp";
    pub const LAST_ACTIVITY: &str = "last_activity";
    pub const USER: &str = "user";
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";
    pub const LOGOUT_REASON: &str = "logout_reason";
}

/// Synchronous string key-value storage for session state.
///
/// Reads are infallible (a broken backend reads as empty); writes report
/// persistence failures so `set_tokens` can refuse a half-written session.
pub trait TokenStorage: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;
    fn remove(&self, key: &str) -> std::io::Result<()>;

    /// Apply every write, or none of them. The token pair is only ever
    /// mutated through the batch operations so a persistence failure
    /// cannot strand half a session.
    fn set_many(&self, entries: &[(&str, &str)]) -> std::io::Result<()>;

    /// Remove every key, or none of them.
    fn remove_many(&self, keys: &[&str]) -> std::io::Result<()>;
}

/// In-memory backend for tests and embedders with their own persistence.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.map.write().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> std::io::Result<()> {
        let mut map = self.map.write();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> std::io::Result<()> {
        let mut map = self.map.write();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// JSON-file backend, the localStorage analogue: a flat string map
/// rewritten on every mutation.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
}

impl FileTokenStorage {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("session file {} is corrupt, starting empty: {e}", path.display());
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path,
            map: RwLock::new(map),
        })
    }

    fn persist(&self, map: &HashMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(map)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, text)
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        let mut map = self.map.write();
        map.insert(key.to_string(), value.to_string());
        self.persist(&map)
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        let mut map = self.map.write();
        if map.remove(key).is_some() {
            self.persist(&map)?;
        }
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> std::io::Result<()> {
        let mut map = self.map.write();
        let previous: Vec<(String, Option<String>)> = entries
            .iter()
            .map(|(key, _)| ((*key).to_string(), map.get(*key).cloned()))
            .collect();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        if let Err(e) = self.persist(&map) {
            // Single persist per batch; on failure restore the old values
            // so disk and memory keep agreeing.
            for (key, value) in previous {
                match value {
                    Some(v) => map.insert(key, v),
                    None => map.remove(&key),
                };
            }
            return Err(e);
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> std::io::Result<()> {
        let mut map = self.map.write();
        let previous: Vec<(String, String)> = keys
            .iter()
            .filter_map(|key| map.get(*key).cloned().map(|v| ((*key).to_string(), v)))
            .collect();
        if previous.is_empty() {
            return Ok(());
        }
        for key in keys {
            map.remove(*key);
        }
        if let Err(e) = self.persist(&map) {
            for (key, value) in previous {
                map.insert(key, value);
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Owner of the session key set.
///
/// Invariant: access and refresh tokens are written and cleared together;
/// there is no state in which only one of the pair survives.
#[derive(Debug, Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn TokenStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(keys::REFRESH_TOKEN)
    }

    /// Persist a fresh token pair plus its issuance timestamp.
    pub fn set_tokens(&self, access: &str, refresh: &str) -> ApiResult<()> {
        let now = self.clock.now_millis().to_string();
        self.storage.set_many(&[
            (keys::ACCESS_TOKEN, access),
            (keys::REFRESH_TOKEN, refresh),
            (keys::TOKEN_TIMESTAMP, now.as_str()),
        ])?;
        Ok(())
    }

    /// The single definitive "logged out" operation: removes both tokens,
    /// the issuance timestamp and the activity stamp together.
    pub fn clear_tokens(&self) -> ApiResult<()> {
        self.storage.remove_many(&[
            keys::ACCESS_TOKEN,
            keys::REFRESH_TOKEN,
            keys::TOKEN_TIMESTAMP,
            keys::LAST_ACTIVITY,
        ])?;
        Ok(())
    }

    /// Age of the current access token, `None` when no issuance timestamp
    /// is stored (treated as "expiring" by the proactive refresh).
    pub fn token_age(&self) -> Option<Duration> {
        let stamp: i64 = self.storage.get(keys::TOKEN_TIMESTAMP)?.parse().ok()?;
        let age = self.clock.now_millis().saturating_sub(stamp);
        Some(Duration::from_millis(age.max(0) as u64))
    }

    pub fn stamp_activity(&self) {
        let now = self.clock.now_millis();
        if let Err(e) = self.storage.set(keys::LAST_ACTIVITY, &now.to_string()) {
            warn!("failed to persist activity stamp: {e}");
        }
    }

    /// Last recorded activity; a missing stamp reads as "now" so a fresh
    /// session is never instantly idle.
    pub fn last_activity(&self) -> i64 {
        self.storage
            .get(keys::LAST_ACTIVITY)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| self.clock.now_millis())
    }

    pub fn set_user(&self, user: &Value) -> ApiResult<()> {
        self.storage.set(keys::USER, &user.to_string())?;
        self.storage.set(keys::IS_AUTHENTICATED, "true")?;
        Ok(())
    }

    pub fn user(&self) -> Option<Value> {
        let raw = self.storage.get(keys::USER)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn clear_user(&self) {
        if let Err(e) = self.storage.remove(keys::USER) {
            warn!("failed to remove user record: {e}");
        }
        if let Err(e) = self.storage.remove(keys::IS_AUTHENTICATED) {
            warn!("failed to remove auth flag: {e}");
        }
    }

    /// Record why the session ended so the login screen can explain it.
    pub fn set_logout_reason(&self, reason: &str) {
        if let Err(e) = self.storage.set(keys::LOGOUT_REASON, reason) {
            warn!("failed to persist logout reason: {e}");
        }
    }

    pub fn take_logout_reason(&self) -> Option<String> {
        let reason = self.storage.get(keys::LOGOUT_REASON)?;
        let _ = self.storage.remove(keys::LOGOUT_REASON);
        Some(reason)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ManualClock;

    fn store_with_clock() -> (TokenStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = TokenStore::new(
            Arc::new(MemoryTokenStorage::new()),
            clock.clone() as Arc<dyn Clock>,
        );
        (store, clock)
    }

    #[test]
    fn set_and_clear_are_all_or_nothing() {
        let (store, _clock) = store_with_clock();
        store.set_tokens("acc", "ref").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("acc"));
        assert_eq!(store.refresh_token().as_deref(), Some("ref"));
        assert!(store.token_age().is_some());

        store.clear_tokens().unwrap();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(store.token_age().is_none());
    }

    #[test]
    fn token_age_follows_clock() {
        let (store, clock) = store_with_clock();
        store.set_tokens("a", "b").unwrap();
        clock.advance(Duration::from_millis(5_000));
        assert_eq!(store.token_age(), Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn missing_activity_stamp_reads_as_now() {
        let (store, clock) = store_with_clock();
        assert_eq!(store.last_activity(), clock.now_millis());
        store.stamp_activity();
        clock.advance(Duration::from_secs(60));
        assert_eq!(store.last_activity(), clock.now_millis() - 60_000);
    }

    #[test]
    fn logout_reason_is_taken_once() {
        let (store, _clock) = store_with_clock();
        store.set_logout_reason("inactivity");
        assert_eq!(store.take_logout_reason().as_deref(), Some("inactivity"));
        assert!(store.take_logout_reason().is_none());
    }

    #[test]
    fn file_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        {
            let storage = FileTokenStorage::open(&path).unwrap();
            storage.set(keys::ACCESS_TOKEN, "acc").unwrap();
            storage.set(keys::REFRESH_TOKEN, "ref").unwrap();
        }
        let reopened = FileTokenStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::ACCESS_TOKEN).as_deref(), Some("acc"));
        reopened.remove(keys::ACCESS_TOKEN).unwrap();
        let again = FileTokenStorage::open(&path).unwrap();
        assert!(again.get(keys::ACCESS_TOKEN).is_none());
        assert_eq!(again.get(keys::REFRESH_TOKEN).as_deref(), Some("ref"));
    }

    #[test]
    fn failed_persist_keeps_the_old_session_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileTokenStorage::open(&path).unwrap();
        let store = TokenStore::new(
            Arc::new(storage),
            Arc::new(ManualClock::new(1_000_000)) as Arc<dyn Clock>,
        );
        store.set_tokens("old-acc", "old-ref").unwrap();

        // A directory at the session path makes every write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.set_tokens("new-acc", "new-ref").is_err());
        assert_eq!(store.access_token().as_deref(), Some("old-acc"));
        assert_eq!(store.refresh_token().as_deref(), Some("old-ref"));

        assert!(store.clear_tokens().is_err());
        assert_eq!(store.access_token().as_deref(), Some("old-acc"));
        assert_eq!(store.refresh_token().as_deref(), Some("old-ref"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let storage = FileTokenStorage::open(&path).unwrap();
        assert!(storage.get(keys::ACCESS_TOKEN).is_none());
    }
}
