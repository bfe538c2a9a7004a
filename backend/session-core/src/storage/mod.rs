//! Durable client-side storage for session credentials.
//!
//! The cookie strategy keeps its cookies in a [`PersistentCookieJar`]. The
//! token strategy persists two entries, [`AUTH_TOKEN_KEY`] and
//! [`AUTH_TOKEN_TYPE_KEY`]. Both are always written and removed together in a
//! single storage operation so a crash can never leave a token without its
//! type (or the reverse).

pub mod cookie_jar;
pub mod file;
pub mod memory;
pub mod paths;

pub use cookie_jar::PersistentCookieJar;
pub use file::FileCredentialStorage;
pub use memory::MemoryCredentialStorage;
pub use paths::{PathSource, SessionPaths, detect_session_paths};

use crate::error::StorageError;

use models::AuthToken;

use log::warn;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const AUTH_TOKEN_TYPE_KEY: &str = "auth_token_type";

/// Key/value store that survives process restarts.
///
/// Implementations must apply each `set_entries` / `remove_entries` call
/// atomically.
pub trait CredentialStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    fn remove_entries(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// Read the persisted token, if any.
///
/// An unusable stored token (blank, whitespace) is reported as absent.
pub fn load_token(storage: &dyn CredentialStorage) -> Result<Option<AuthToken>, StorageError> {
    let Some(token) = storage.get(AUTH_TOKEN_KEY)? else {
        return Ok(None);
    };
    let token_type = storage.get(AUTH_TOKEN_TYPE_KEY)?;

    match AuthToken::new(token, token_type.as_deref()) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            warn!("Ignoring unusable persisted token: {}", e);
            Ok(None)
        }
    }
}

pub fn persist_token(storage: &dyn CredentialStorage, token: &AuthToken) -> Result<(), StorageError> {
    storage.set_entries(&[
        (AUTH_TOKEN_KEY, token.token().expose()),
        (AUTH_TOKEN_TYPE_KEY, token.token_type()),
    ])
}

pub fn clear_token(storage: &dyn CredentialStorage) -> Result<(), StorageError> {
    storage.remove_entries(&[AUTH_TOKEN_KEY, AUTH_TOKEN_TYPE_KEY])
}
