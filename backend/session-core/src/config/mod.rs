//! Session configuration: API endpoint, auth strategy, CSRF settings.

pub mod env;

use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const MAX_TIMEOUT_SECS: u64 = 300;

// ============================================
// ENUMS WITH DEFAULTS
// ============================================

/// How the client proves it is authenticated.
///
/// Exactly one strategy is active per session manager. They are never mixed:
/// the bearer strategy persists a token and skips CSRF priming, the cookie
/// strategy persists nothing and primes before every mutating request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    #[default]
    BearerToken,
    CookieSession,
}

impl std::fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStrategy::BearerToken => write!(f, "bearer_token"),
            AuthStrategy::CookieSession => write!(f, "cookie_session"),
        }
    }
}

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    #[serde(default = "default_csrf_cookie_path")]
    pub cookie_path: String,
    #[serde(default = "default_csrf_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_csrf_header_name")]
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            cookie_path: default_csrf_cookie_path(),
            cookie_name: default_csrf_cookie_name(),
            header_name: default_csrf_header_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub strategy: AuthStrategy,
    #[serde(default = "default_bootstrap_timeout_ms")]
    pub bootstrap_timeout_ms: u64,
    #[serde(default)]
    pub csrf: CsrfConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: AuthStrategy::default(),
            bootstrap_timeout_ms: default_bootstrap_timeout_ms(),
            csrf: CsrfConfig::default(),
        }
    }
}

impl AuthConfig {
    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_base_url() -> String {
    crate::DEFAULT_API_BASE_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_bootstrap_timeout_ms() -> u64 {
    10_000
}
fn default_csrf_cookie_path() -> String {
    "sanctum/csrf-cookie".to_string()
}
fn default_csrf_cookie_name() -> String {
    "XSRF-TOKEN".to_string()
}
fn default_csrf_header_name() -> String {
    "X-XSRF-TOKEN".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl SessionConfig {
    /// Default config pointed at `base_url` with the given strategy.
    pub fn for_endpoint(base_url: impl Into<String>, strategy: AuthStrategy) -> Self {
        let mut config = Self::default();
        config.api.base_url = base_url.into();
        config.auth.strategy = strategy;
        config
    }

    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(SessionConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: SessionConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// Uses temp file + rename for atomicity (no corruption on crash).
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::validation(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        let base_url = Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::validation(format!("Invalid base_url '{}': {}", self.api.base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::validation(format!(
                "base_url must be http or https: {}",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_secs == 0 || self.api.request_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::validation(format!(
                "Invalid request timeout: {}s (must be 1-{})",
                self.api.request_timeout_secs, MAX_TIMEOUT_SECS
            )));
        }

        if self.auth.bootstrap_timeout_ms == 0
            || self.auth.bootstrap_timeout_ms > MAX_TIMEOUT_SECS * 1000
        {
            return Err(ConfigError::validation(format!(
                "Invalid bootstrap timeout: {}ms",
                self.auth.bootstrap_timeout_ms
            )));
        }

        let csrf = &self.auth.csrf;
        if csrf.cookie_path.trim().is_empty()
            || csrf.cookie_name.trim().is_empty()
            || csrf.header_name.trim().is_empty()
        {
            return Err(ConfigError::validation(
                "CSRF cookie_path, cookie_name and header_name must not be empty",
            ));
        }

        Ok(())
    }
}
