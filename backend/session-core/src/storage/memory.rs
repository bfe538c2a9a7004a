use super::CredentialStorage;
use crate::error::StorageError;

use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage, as if a previous process had logged in.
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::unavailable(format!("Memory storage poisoned: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn set_entries(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::unavailable(format!("Memory storage poisoned: {e}")))?;
        for (key, value) in new_entries {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::unavailable(format!("Memory storage poisoned: {e}")))?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
