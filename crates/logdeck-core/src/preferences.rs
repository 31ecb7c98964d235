/*
[INPUT]:  Preference key + string map from view settings (formatter fields)
[OUTPUT]: Session-only or JSON-file-backed persisted settings
[POS]:    Persistence layer - pluggable preference store
[UPDATE]: When changing the on-disk preference format
*/

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Temporary file error: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Corrupt preference file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PreferenceError>;

pub type PreferenceMap = BTreeMap<String, String>;

/// Key/value store for view settings.
pub trait PreferenceStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<PreferenceMap>>;

    fn store(&self, key: &str, values: PreferenceMap) -> Result<()>;
}

/// Settings that live for the current process only.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: Mutex<HashMap<String, PreferenceMap>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Result<Option<PreferenceMap>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn store(&self, key: &str, values: PreferenceMap) -> Result<()> {
        self.entries.lock().insert(key.to_string(), values);
        Ok(())
    }
}

/// All keys in one JSON document, rewritten atomically on every store.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, PreferenceMap>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|err| PreferenceError::Corrupt {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        })
    }

    fn write_all(&self, all: &BTreeMap<String, PreferenceMap>) -> Result<()> {
        let parent_dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent_dir)?;

        // Atomic write: write to temp file then rename
        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        let json_str = serde_json::to_string_pretty(all)?;
        temp_file.write_all(json_str.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self, key: &str) -> Result<Option<PreferenceMap>> {
        Ok(self.read_all()?.remove(key))
    }

    fn store(&self, key: &str, values: PreferenceMap) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut all = self.read_all()?;
        all.insert(key.to_string(), values);
        self.write_all(&all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(value: &str) -> PreferenceMap {
        let mut map = PreferenceMap::new();
        map.insert("LEVEL".to_string(), value.to_string());
        map
    }

    #[test]
    fn missing_file_loads_nothing() {
        let tmp_dir = TempDir::new().unwrap();
        let store = JsonPreferenceStore::new(tmp_dir.path().join("prefs.json"));
        assert!(store.load("log.view").unwrap().is_none());
    }

    #[test]
    fn keys_are_kept_apart() {
        let tmp_dir = TempDir::new().unwrap();
        let store = JsonPreferenceStore::new(tmp_dir.path().join("nested/prefs.json"));
        store.store("first", sample("true")).unwrap();
        store.store("second", sample("false")).unwrap();

        let reopened = JsonPreferenceStore::new(store.path().to_path_buf());
        assert_eq!(reopened.load("first").unwrap(), Some(sample("true")));
        assert_eq!(reopened.load("second").unwrap(), Some(sample("false")));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("corrupted.json");
        std::fs::write(&path, "invalid json").unwrap();
        let store = JsonPreferenceStore::new(path);

        let result = store.load("anything");
        assert!(matches!(result, Err(PreferenceError::Corrupt { .. })));
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryPreferenceStore::new();
        store.store("k", sample("true")).unwrap();
        store.store("k", sample("false")).unwrap();
        assert_eq!(store.load("k").unwrap(), Some(sample("false")));
    }
}
