//! `.env` loading and environment overrides.
//!
//! Lookup order for `.env`:
//! 1. Current working directory
//! 2. Directory of the running executable
//!
//! A missing `.env` is not an error; existing process variables still apply.

use super::SessionConfig;
use crate::error::config::ConfigError;

use std::env;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

/// Overrides `api.base_url`.
pub const API_URL_ENV: &str = "SESSION_API_URL";

/// Result of attempting to load .env file.
#[derive(Debug)]
pub struct EnvLoadResult {
    /// Path to loaded .env file, if found.
    pub path: Option<PathBuf>,
    /// Whether any .env file was loaded.
    pub loaded: bool,
}

/// Attempts to load .env from known locations.
pub fn try_load_dotenv() -> EnvLoadResult {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return EnvLoadResult {
            path: Some(path),
            loaded: true,
        };
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let env_path = exe_dir.join(".env");
            if env_path.exists() {
                match dotenvy::from_path(&env_path) {
                    Ok(_) => {
                        info!("Loaded .env from: {:?}", env_path);
                        return EnvLoadResult {
                            path: Some(env_path),
                            loaded: true,
                        };
                    }
                    Err(e) => {
                        warn!("Failed to parse .env at {:?}: {}", env_path, e);
                    }
                }
            }
        }
    }

    debug!("No .env file found - using process environment only");
    EnvLoadResult {
        path: None,
        loaded: false,
    }
}

impl SessionConfig {
    /// Apply environment overrides, then re-validate.
    ///
    /// Blank values are ignored.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        match env::var(API_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => {
                info!("Using {} override: {}", API_URL_ENV, value.trim());
                self.api.base_url = value.trim().to_string();
            }
            Ok(_) => debug!("{} is set but blank, ignoring", API_URL_ENV),
            Err(env::VarError::NotPresent) => {}
            Err(env::VarError::NotUnicode(_)) => {
                warn!("Env var {} contains invalid unicode, ignoring", API_URL_ENV);
            }
        }

        self.validate()
    }

    /// Load `.env`, the config file, and apply overrides.
    pub fn load_with_env(config_dir: &Path) -> Result<Self, ConfigError> {
        try_load_dotenv();
        let mut config = Self::load(config_dir)?;
        config.apply_env_overrides()?;
        Ok(config)
    }
}
