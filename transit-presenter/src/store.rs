//! Local persistent storage for the API key
//!
//! A single JSON object file of string keys to string values. Storage
//! problems never surface to callers: reads return nothing and writes are
//! dropped, with a warning in the log.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage key the API key is kept under
pub const API_KEY_STORAGE_KEY: &str = "google_maps_api_key";

/// File-backed key-value store
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: Option<PathBuf>,
}

impl LocalStorage {
    /// Storage backed by the given file; it is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Storage that holds nothing and accepts no writes
    pub fn unavailable() -> Self {
        Self { path: None }
    }

    pub fn from_config(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::new(path),
            None => Self::unavailable(),
        }
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        let path = self.path.as_ref()?;
        self.read_all(path).remove(key)
    }

    pub fn set_item(&self, key: &str, value: &str) {
        let Some(path) = self.path.as_ref() else {
            debug!(key, "Storage unavailable, dropping write");
            return;
        };

        let mut items = self.read_all(path);
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create storage directory");
                return;
            }
        }

        let contents = match serde_json::to_string_pretty(&items) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to serialize storage");
                return;
            }
        };

        if let Err(e) = std::fs::write(path, contents) {
            warn!(path = %path.display(), error = %e, "Failed to write storage");
        }
    }

    fn read_all(&self, path: &Path) -> BTreeMap<String, String> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read storage");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt storage file");
            BTreeMap::new()
        })
    }
}

/// The API key input and its persisted value
#[derive(Debug, Clone)]
pub struct ApiKeyStore {
    storage: LocalStorage,
    value: String,
}

impl ApiKeyStore {
    /// Pre-fill the key from storage when one was saved
    pub fn load(storage: LocalStorage) -> Self {
        let value = storage.get_item(API_KEY_STORAGE_KEY).unwrap_or_default();
        Self { storage, value }
    }

    /// Current value of the key input
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Change event: take the new value and persist it
    pub fn on_change(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.storage.set_item(API_KEY_STORAGE_KEY, &self.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = ApiKeyStore::load(LocalStorage::new(&path));
        assert_eq!(store.value(), "");

        store.on_change("AIza-test");
        let reloaded = ApiKeyStore::load(LocalStorage::new(&path));
        assert_eq!(reloaded.value(), "AIza-test");
    }

    #[test]
    fn test_change_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage.json"));

        storage.set_item(API_KEY_STORAGE_KEY, "old");
        storage.set_item("other", "kept");
        ApiKeyStore::load(storage.clone()).on_change("new");

        assert_eq!(storage.get_item(API_KEY_STORAGE_KEY).as_deref(), Some("new"));
        assert_eq!(storage.get_item("other").as_deref(), Some("kept"));
    }

    #[test]
    fn test_unavailable_storage_is_a_no_op() {
        let mut store = ApiKeyStore::load(LocalStorage::unavailable());
        store.on_change("AIza-test");
        assert_eq!(store.value(), "AIza-test");
        assert!(LocalStorage::unavailable().get_item(API_KEY_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_corrupt_storage_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = ApiKeyStore::load(LocalStorage::new(&path));
        assert_eq!(store.value(), "");
    }

    #[test]
    fn test_unwritable_storage_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail
        let storage = LocalStorage::new(dir.path());
        storage.set_item(API_KEY_STORAGE_KEY, "value");
        assert!(storage.get_item(API_KEY_STORAGE_KEY).is_none());
    }
}
