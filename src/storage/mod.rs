//! Durable local key/value state.
//!
//! A single JSON object on disk, keyed by fixed names (`session`,
//! `apiConstants`). Reads of a missing file yield an empty store; every write
//! goes through a temp file and a rename so a crash never leaves half a file.
//! The file holds the session token, so on Unix it is written owner-only (0600).

mod error;

pub use error::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File-backed key/value store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the value stored under `key`.
    ///
    /// A value that no longer decodes into `T` is reported as corrupt rather
    /// than silently replaced.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut entries = self.read_all()?;
        match entries.remove(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    path: self.path.clone(),
                    message: format!("{}: {}", key, e),
                }),
            None => Ok(None),
        }
    }

    /// Store `value` under `key`, keeping every other entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_value(value).map_err(|e| StorageError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), encoded);
        self.write_all(&entries)
    }

    /// Remove `key`. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_none() {
            return Ok(false);
        }
        self.write_all(&entries)?;
        Ok(true)
    }

    fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(StorageError::Corrupt {
                path: self.path.clone(),
                message: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(StorageError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn write_all(&self, entries: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Encode {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, body.as_bytes())?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::trace!(
            path = %self.path.display(),
            entries = entries.len(),
            "State file written"
        );
        Ok(())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // A temp file left behind by a crash keeps its old mode
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(body)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, body)
}
