//! Platform-aware detection of session data and config directories.
//!
//! Lookup order:
//! 1. SESSION_DATA_DIR environment variable (explicit override, holds everything)
//! 2. Platform-specific directories via `dirs` crate
//! 3. `$HOME` fallback
//!
//! Returns Result, never silently falls back to wrong path.

use crate::error::StorageError;

use std::env;
use std::path::PathBuf;

use log::{debug, info, warn};

pub const DATA_DIR_ENV: &str = "SESSION_DATA_DIR";

const APP_DIR_NAME: &str = "session-core";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";
const COOKIES_FILE_NAME: &str = "cookies.json";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone)]
pub struct SessionPaths {
    /// Holds the credential file and logs.
    pub data_dir: PathBuf,
    /// Holds config.json.
    pub config_dir: PathBuf,
    pub credentials_file: PathBuf,
    /// Cookie jar of the cookie strategy.
    pub cookies_file: PathBuf,
    pub log_dir: PathBuf,
    /// How the path was determined.
    pub source: PathSource,
}

/// How the path was determined (for debugging/logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// Set via SESSION_DATA_DIR environment variable.
    EnvVar,
    /// Detected via platform-specific XDG/AppData/Library path.
    PlatformDefault,
    /// `$HOME/.local/share` style fallback.
    HomeFallback,
}

impl std::fmt::Display for PathSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSource::EnvVar => write!(f, "{}", DATA_DIR_ENV),
            PathSource::PlatformDefault => write!(f, "platform default"),
            PathSource::HomeFallback => write!(f, "home fallback"),
        }
    }
}

impl SessionPaths {
    fn rooted(data_dir: PathBuf, config_dir: PathBuf, source: PathSource) -> Self {
        Self {
            credentials_file: data_dir.join(CREDENTIALS_FILE_NAME),
            cookies_file: data_dir.join(COOKIES_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            data_dir,
            config_dir,
            source,
        }
    }
}

/// Detect session data paths.
///
/// # Errors
/// Returns `StorageError::PathDetection` if no valid path can be determined.
pub fn detect_session_paths() -> Result<SessionPaths, StorageError> {
    if let Ok(custom_dir) = env::var(DATA_DIR_ENV) {
        if !custom_dir.trim().is_empty() {
            let data_dir = PathBuf::from(custom_dir.trim());
            info!("Using {} override: {:?}", DATA_DIR_ENV, data_dir);
            return Ok(SessionPaths::rooted(
                data_dir.clone(),
                data_dir,
                PathSource::EnvVar,
            ));
        }
    }

    if let (Some(data_dir), Some(config_dir)) = (dirs::data_local_dir(), dirs::config_dir()) {
        let data_dir = data_dir.join(APP_DIR_NAME);
        let config_dir = config_dir.join(APP_DIR_NAME);
        debug!("Platform data dir: {:?}, config dir: {:?}", data_dir, config_dir);
        return Ok(SessionPaths::rooted(
            data_dir,
            config_dir,
            PathSource::PlatformDefault,
        ));
    }

    if let Some(home) = dirs::home_dir() {
        let data_dir = home.join(".local").join("share").join(APP_DIR_NAME);
        let config_dir = home.join(".config").join(APP_DIR_NAME);
        warn!("Using home fallback path: {:?}", data_dir);
        return Ok(SessionPaths::rooted(
            data_dir,
            config_dir,
            PathSource::HomeFallback,
        ));
    }

    Err(StorageError::path_detection(format!(
        "Cannot determine session data directory. Set {} environment variable.",
        DATA_DIR_ENV
    )))
}
