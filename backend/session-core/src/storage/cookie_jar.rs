//! Cookie jar for the cookie strategy that can outlive the process.
//!
//! The backend session cookie is the credential of the cookie strategy, so it
//! is stored the same way the bearer token is: a JSON file next to
//! `credentials.json`, rewritten with temp file + rename and mode 0600. Session
//! cookies without an expiry are kept too, matching a browser that restores
//! its session on restart.

use super::file::restrict_permissions;
use crate::error::StorageError;

use common::ErrorLocation;

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cookie_store::{CookieStore as Cookies, RawCookie};
use log::{debug, warn};
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use url::Url;

pub struct PersistentCookieJar {
    cookies: RwLock<Cookies>,
    path: Option<PathBuf>,
}

impl PersistentCookieJar {
    /// Jar that is never written anywhere.
    pub fn in_memory() -> Self {
        Self {
            cookies: RwLock::new(Cookies::default()),
            path: None,
        }
    }

    /// Jar backed by `path`, starting from its current contents.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; the next save replaces it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cookies = match read_cookies(&path) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!("Ignoring unusable cookie file: {}", e);
                Cookies::default()
            }
        };

        Self {
            cookies: RwLock::new(cookies),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.read().iter_unexpired().next().is_none()
    }

    /// Percent-decoded value of cookie `name` as it would be sent to `url`.
    pub fn value(&self, url: &Url, name: &str) -> Option<String> {
        let cookies = self.read();
        let (_, value) = cookies
            .get_request_values(url)
            .find(|(key, _)| *key == name)?;

        Some(
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string()),
        )
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Write the jar to its file. No-op for an in-memory jar.
    pub fn save(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut json = Vec::new();
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.read(), &mut json)
            .map_err(|e| StorageError::Parse {
                path: path.clone(),
                reason: e.to_string(),
                location: ErrorLocation::caller(),
            })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Write {
                path: parent.to_path_buf(),
                source: e,
                location: ErrorLocation::caller(),
            })?;
        }

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| StorageError::Write {
            path: temp_path.clone(),
            source: e,
            location: ErrorLocation::caller(),
        })?;

        restrict_permissions(&temp_path)?;

        std::fs::rename(&temp_path, path).map_err(|e| StorageError::Write {
            path: path.clone(),
            source: e,
            location: ErrorLocation::caller(),
        })?;

        debug!("Cookie jar written: {}", path.display());
        Ok(())
    }

    // Lock poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Cookies> {
        self.cookies
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cookies> {
        self.cookies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PersistentCookieJar {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for PersistentCookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Cookie values are credentials.
        f.debug_struct("PersistentCookieJar")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CookieStore for PersistentCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let parsed = cookie_headers.filter_map(|header| {
            let raw = header.to_str().ok()?;
            RawCookie::parse(raw.to_owned()).ok()
        });
        self.write().store_response_cookies(parsed, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .read()
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

fn read_cookies(path: &Path) -> Result<Cookies, StorageError> {
    if !path.exists() {
        return Ok(Cookies::default());
    }

    let file = std::fs::File::open(path).map_err(|e| StorageError::Read {
        path: path.to_path_buf(),
        source: e,
        location: ErrorLocation::caller(),
    })?;

    cookie_store::serde::json::load_all(BufReader::new(file)).map_err(|e| StorageError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
        location: ErrorLocation::caller(),
    })
}
