use crate::config::{ApiConfig, AuthStrategy};
use crate::transport::{ApiClient, requires_priming};

use models::AuthToken;

use reqwest::Method;

fn client(base_url: &str) -> ApiClient {
    let config = ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    };
    ApiClient::new(&config, AuthStrategy::BearerToken).unwrap()
}

/// **VALUE**: Verifies that endpoints stay under the base path.
///
/// **WHY THIS MATTERS**: With `Url::join`, `"/me"` against `http://host/api` would resolve
/// to `http://host/me` and hit the wrong route.
///
/// **BUG THIS CATCHES**: Would catch the trailing-slash normalization or the leading-slash
/// trimming being removed.
#[test]
fn given_base_path_without_trailing_slash_when_joining_then_path_preserved() {
    // GIVEN
    let client = client("http://localhost:8000/api");

    // WHEN
    let me = client.endpoint("/me").unwrap();
    let csrf = client.endpoint("sanctum/csrf-cookie").unwrap();

    // THEN
    assert_eq!(me.as_str(), "http://localhost:8000/api/me");
    assert_eq!(csrf.as_str(), "http://localhost:8000/api/sanctum/csrf-cookie");
}

/// **VALUE**: Verifies which methods require CSRF priming.
///
/// **WHY THIS MATTERS**: Skipping priming on a mutating method gets a 419 from the backend;
/// priming on reads doubles their latency.
///
/// **BUG THIS CATCHES**: Would catch a method being moved to the wrong set.
#[test]
fn given_http_methods_when_classified_then_only_mutating_require_priming() {
    // GIVEN / WHEN / THEN
    for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
        assert!(requires_priming(&method), "{method} must prime");
    }
    for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
        assert!(!requires_priming(&method), "{method} must not prime");
    }
}

/// **VALUE**: Verifies attaching and detaching the bearer header.
///
/// **WHY THIS MATTERS**: After logout no request may carry the old token.
///
/// **BUG THIS CATCHES**: Would catch `set_auth_token(None)` leaving the header in place.
#[tokio::test]
async fn given_token_when_attached_then_detached_then_header_state_follows() {
    // GIVEN
    let client = client("http://localhost:8000/");
    let token = AuthToken::new("abc", None).unwrap();

    // WHEN / THEN
    client.set_auth_token(Some(&token)).await.unwrap();
    assert!(client.has_auth_token().await);

    client.set_auth_token(None).await.unwrap();
    assert!(!client.has_auth_token().await);
}

/// **VALUE**: Verifies that the bearer strategy has no cookie jar.
///
/// **WHY THIS MATTERS**: The two strategies must not be mixed; a bearer client silently
/// carrying session cookies would authenticate by two mechanisms at once.
///
/// **BUG THIS CATCHES**: Would catch the jar being installed unconditionally.
#[test]
fn given_bearer_client_when_reading_cookie_then_none() {
    // GIVEN / WHEN / THEN
    assert!(client("http://localhost:8000/").cookie_value("XSRF-TOKEN").is_none());
}

/// **VALUE**: Verifies that non-base URLs are rejected at construction.
///
/// **BUG THIS CATCHES**: Would catch `mailto:`-style URLs slipping through.
#[test]
fn given_cannot_be_base_url_when_building_client_then_error() {
    // GIVEN
    let config = ApiConfig {
        base_url: "mailto:someone@example.com".to_string(),
        ..ApiConfig::default()
    };

    // WHEN / THEN
    assert!(ApiClient::new(&config, AuthStrategy::BearerToken).is_err());
}
