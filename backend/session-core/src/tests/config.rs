use crate::config::env::API_URL_ENV;
use crate::config::{AuthStrategy, SessionConfig};
use crate::error::ConfigError;

use serial_test::serial;

/// **VALUE**: Verifies that the built-in defaults pass validation.
///
/// **WHY THIS MATTERS**: A fresh install has no config file; if defaults were invalid the
/// client could never start.
///
/// **BUG THIS CATCHES**: Would catch a default drifting outside the validated ranges.
#[test]
fn given_default_config_when_validated_then_ok() {
    // GIVEN / WHEN
    let config = SessionConfig::default();

    // THEN
    assert!(config.validate().is_ok());
    assert_eq!(config.auth.strategy, AuthStrategy::BearerToken);
    assert_eq!(config.auth.csrf.cookie_path, "sanctum/csrf-cookie");
}

/// **VALUE**: Verifies that a missing config file yields defaults, and a saved one is
/// read back.
///
/// **WHY THIS MATTERS**: The CLI persists the chosen strategy and endpoint between runs.
///
/// **BUG THIS CATCHES**: Would catch serde renames (`cookie_session`) breaking the file
/// format.
#[test]
fn given_saved_config_when_loaded_then_values_preserved() {
    // GIVEN: Empty dir loads defaults
    let dir = tempfile::tempdir().unwrap();
    let defaults = SessionConfig::load(dir.path()).unwrap();
    assert_eq!(defaults.api.base_url, crate::DEFAULT_API_BASE_URL);

    // WHEN: Saving a customised config and loading it again
    let config = SessionConfig::for_endpoint("https://blog.example/api", AuthStrategy::CookieSession);
    config.save(dir.path()).unwrap();
    let loaded = SessionConfig::load(dir.path()).unwrap();

    // THEN
    assert_eq!(loaded.api.base_url, "https://blog.example/api");
    assert_eq!(loaded.auth.strategy, AuthStrategy::CookieSession);
    let raw = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    assert!(raw.contains("\"cookie_session\""));
}

/// **VALUE**: Verifies that invalid values are rejected on load.
///
/// **WHY THIS MATTERS**: A non-http base URL or a zero timeout would make every request
/// fail in confusing ways later on.
///
/// **BUG THIS CATCHES**: Would catch `load` skipping `validate`.
#[test]
fn given_invalid_values_when_loaded_then_validation_error() {
    // GIVEN: A config with an ftp URL
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"version":1,"api":{"base_url":"ftp://example.com/"}}"#,
    )
    .unwrap();

    // WHEN
    let result = SessionConfig::load(dir.path());

    // THEN
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));

    let mut zero_timeout = SessionConfig::default();
    zero_timeout.auth.bootstrap_timeout_ms = 0;
    assert!(zero_timeout.validate().is_err());
}

/// **VALUE**: Verifies that the API URL can be overridden from the environment.
///
/// **WHY THIS MATTERS**: Deployments point the same build at different backends via
/// `SESSION_API_URL` (often from `.env`).
///
/// **BUG THIS CATCHES**: Would catch the override being ignored or not validated.
#[test]
#[serial]
fn given_env_override_when_applied_then_base_url_replaced() {
    // GIVEN
    let mut config = SessionConfig::default();
    unsafe { std::env::set_var(API_URL_ENV, "https://api.blog.example/") };

    // WHEN
    let result = config.apply_env_overrides();
    unsafe { std::env::remove_var(API_URL_ENV) };

    // THEN
    assert!(result.is_ok());
    assert_eq!(config.api.base_url, "https://api.blog.example/");
}

/// **VALUE**: Verifies that an invalid override is rejected.
///
/// **BUG THIS CATCHES**: Would catch overrides bypassing validation.
#[test]
#[serial]
fn given_invalid_env_override_when_applied_then_validation_error() {
    // GIVEN
    let mut config = SessionConfig::default();
    unsafe { std::env::set_var(API_URL_ENV, "not a url") };

    // WHEN
    let result = config.apply_env_overrides();
    unsafe { std::env::remove_var(API_URL_ENV) };

    // THEN
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

/// **VALUE**: Verifies that a config file without a strategy selects bearer tokens.
///
/// **WHY THIS MATTERS**: Config files written before the strategy existed must keep working
/// with the token flow they were set up for.
///
/// **BUG THIS CATCHES**: Would catch the derived default moving to another variant.
#[test]
fn given_config_without_strategy_when_deserialized_then_bearer_token() {
    // GIVEN
    let raw = r#"{ "auth": { "bootstrap_timeout_ms": 5000 } }"#;

    // WHEN
    let config: SessionConfig = serde_json::from_str(raw).unwrap();

    // THEN
    assert_eq!(AuthStrategy::default(), AuthStrategy::BearerToken);
    assert_eq!(config.auth.strategy, AuthStrategy::BearerToken);
    assert_eq!(config.auth.bootstrap_timeout_ms, 5000);
}
