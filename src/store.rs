//! Key-value persistence for the profile, goals and activity log
//!
//! Values are JSON documents addressed by a short key. `FileStore` keeps one
//! file per key; `MemoryStore` backs tests and dry runs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::activity_log::ActivityLog;
use crate::error::{Result, StorageError};
use crate::models::{Goals, Profile};

pub const PROFILE_KEY: &str = "profile";
pub const GOALS_KEY: &str = "goals";
pub const ACTIVITY_LOG_KEY: &str = "activity_log";

/// Minimal string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Readers never observe a partially written document
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Decode the JSON value under `key`, `None` when absent
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
            StorageError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        }),
        None => Ok(None),
    }
}

/// Encode `value` as JSON under `key`
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string_pretty(value).map_err(|e| StorageError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &raw)
}

/// Everything the application persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub profile: Profile,
    pub goals: Goals,
    pub log: ActivityLog,
}

impl AppState {
    /// Load each section, defaulting the ones never saved
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self> {
        let state = AppState {
            profile: load_json(store, PROFILE_KEY)?.unwrap_or_default(),
            goals: load_json(store, GOALS_KEY)?.unwrap_or_default(),
            log: load_json(store, ACTIVITY_LOG_KEY)?.unwrap_or_default(),
        };
        info!(
            days = state.log.day_count(),
            entries = state.log.entry_count(),
            "Loaded application state"
        );
        Ok(state)
    }

    pub fn save_profile<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        save_json(store, PROFILE_KEY, &self.profile)
    }

    pub fn save_goals<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        save_json(store, GOALS_KEY, &self.goals)
    }

    pub fn save_log<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        save_json(store, ACTIVITY_LOG_KEY, &self.log)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        self.save_profile(store)?;
        self.save_goals(store)?;
        self.save_log(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActivityLogError;
    use crate::models::{ActivityKind, Entry};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_state() -> AppState {
        let mut state = AppState::default();
        state.profile.name = "Ana".to_string();
        state.goals.steps = 8000;
        state.log.add_entry(
            NaiveDate::from_ymd_opt(2025, 10, 26).unwrap(),
            Entry {
                id: "a1".to_string(),
                activity_kind: ActivityKind::Cycling,
                steps: 0,
                duration_minutes: 40.0,
                distance_km: 12.0,
                calories: 317,
                heart_rate: 125,
                notes: "commute".to_string(),
            },
        );
        state
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let state = sample_state();
        state.save(&mut store).unwrap();

        let loaded = AppState::load(&store).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_missing_keys_load_defaults() {
        let store = MemoryStore::new();
        let state = AppState::load(&store).unwrap();
        assert_eq!(state.profile, Profile::default());
        assert_eq!(state.goals, Goals::default());
        assert!(state.log.is_empty());
    }

    #[test]
    fn test_corrupted_value() {
        let mut store = MemoryStore::new();
        store.set(ACTIVITY_LOG_KEY, "{not json").unwrap();

        let err = AppState::load(&store).unwrap_err();
        assert!(matches!(
            err,
            ActivityLogError::Storage(StorageError::Corrupted { ref key, .. }) if key == ACTIVITY_LOG_KEY
        ));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("data")).unwrap();
        let state = sample_state();
        state.save(&mut store).unwrap();

        assert!(dir.path().join("data").join("activity_log.json").exists());

        let reopened = FileStore::open(dir.path().join("data")).unwrap();
        assert_eq!(AppState::load(&reopened).unwrap(), state);
    }

    #[test]
    fn test_file_store_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("goals", "{}").unwrap();

        store.remove("goals").unwrap();
        store.remove("goals").unwrap();
        assert_eq!(store.get("goals").unwrap(), None);
    }
}
