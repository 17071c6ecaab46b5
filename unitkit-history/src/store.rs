//! Key-value storage for persisted history and favorites
//!
//! Values are opaque strings (JSON in practice) stored under namespaced
//! keys. `MemoryStore` keeps them in a map, `FileStore` writes one
//! `<key>.json` file per key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key holding the conversion history
pub const CONVERSIONS_KEY: &str = "unit-converter.conversions";

/// Key holding the favorite conversions
pub const FAVORITES_KEY: &str = "unit-converter.favorites";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed data under {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Flat string storage keyed by name
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON value. A missing key is `Ok(None)`.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Json { key: key.to_string(), source }),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let text = serde_json::to_string(value)
        .map_err(|source| StoreError::Json { key: key.to_string(), source })?;
    store.set(key, &text)
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// In-process store, lost on exit
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Directory-backed store, one file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// The directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)
            .map_err(|source| StoreError::Io { path: self.root.clone(), source })?;
        // Write then rename so readers never see a half-written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path: path.clone(), source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a.b").unwrap(), None);
        store.set("a.b", "[1,2]").unwrap();
        assert_eq!(store.get("a.b").unwrap().as_deref(), Some("[1,2]"));
        store.remove("a.b").unwrap();
        assert_eq!(store.get("a.b").unwrap(), None);
    }

    #[test]
    fn test_rejects_bad_keys() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.set("../etc/passwd", "x"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
        // Keys are checked before the filesystem is touched
        let file_store = FileStore::new("/nonexistent/unitkit");
        assert!(matches!(file_store.get(".hidden"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn test_json_helpers() {
        let mut store = MemoryStore::new();
        save_json(&mut store, FAVORITES_KEY, &vec!["m", "km"]).unwrap();
        let loaded: Option<Vec<String>> = load_json(&store, FAVORITES_KEY).unwrap();
        assert_eq!(loaded, Some(vec!["m".to_string(), "km".to_string()]));

        store.set(CONVERSIONS_KEY, "{not json").unwrap();
        let broken: Result<Option<Vec<String>>, _> = load_json(&store, CONVERSIONS_KEY);
        assert!(matches!(broken, Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("data");
        let mut store = FileStore::new(&root);
        assert_eq!(store.get(CONVERSIONS_KEY).unwrap(), None);

        store.set(CONVERSIONS_KEY, "[]").unwrap();
        assert!(root.join("unit-converter.conversions.json").exists());
        assert_eq!(store.get(CONVERSIONS_KEY).unwrap().as_deref(), Some("[]"));

        store.remove(CONVERSIONS_KEY).unwrap();
        store.remove(CONVERSIONS_KEY).unwrap();
        assert_eq!(store.get(CONVERSIONS_KEY).unwrap(), None);
    }
}
