//! JSON-file credential storage.
//!
//! The whole map is rewritten on every change using temp file + rename, so a
//! reader sees either the old or the new set of entries, never a mix.

use super::CredentialStorage;
use crate::error::StorageError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

#[derive(Debug)]
pub struct FileCredentialStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileCredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| StorageError::Read {
            path: self.path.clone(),
            source: e,
            location: ErrorLocation::caller(),
        })?;

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| StorageError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
            location: ErrorLocation::caller(),
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Write {
                path: parent.to_path_buf(),
                source: e,
                location: ErrorLocation::caller(),
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
            location: ErrorLocation::caller(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| StorageError::Write {
            path: temp_path.clone(),
            source: e,
            location: ErrorLocation::caller(),
        })?;

        restrict_permissions(&temp_path)?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| StorageError::Write {
            path: self.path.clone(),
            source: e,
            location: ErrorLocation::caller(),
        })?;

        debug!("Credential storage written: {}", self.path.display());
        Ok(())
    }

    fn modify(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::unavailable(format!("Storage lock poisoned: {e}")))?;

        let mut entries = self.read_all()?;
        change(&mut entries);
        self.write_all(&entries)
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_entries(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.modify(|entries| {
            for (key, value) in new_entries {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

#[cfg(unix)]
pub(super) fn restrict_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|e| {
        StorageError::Write {
            path: path.to_path_buf(),
            source: e,
            location: ErrorLocation::caller(),
        }
    })
}

#[cfg(not(unix))]
pub(super) fn restrict_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}
