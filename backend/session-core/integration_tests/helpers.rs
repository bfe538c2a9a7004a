//! Test helpers for session integration tests.
//!
//! - Configs pointed at a `wiremock` server for either strategy
//! - Managers backed by in-memory credential storage
//! - Request log extraction for ordering assertions
//! - A cookie-session backend that only knows users presenting its cookie

use session_core::storage::{
    AUTH_TOKEN_KEY, AUTH_TOKEN_TYPE_KEY, CredentialStorage, MemoryCredentialStorage,
    PersistentCookieJar,
};
use session_core::{AuthStrategy, SessionConfig, SessionManager};

use models::LoginCredentials;

use std::sync::Arc;

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const TEST_EMAIL: &str = "a@b.com";
pub const TEST_PASSWORD: &str = "x";
pub const CSRF_PATH: &str = "/sanctum/csrf-cookie";
pub const SESSION_COOKIE: &str = "laravel_session=s3cr3t";

pub fn config(server: &MockServer, strategy: AuthStrategy) -> SessionConfig {
    let mut config = SessionConfig::for_endpoint(server.uri(), strategy);
    config.auth.bootstrap_timeout_ms = 2_000;
    config
}

pub fn bearer_manager(server: &MockServer, storage: &Arc<MemoryCredentialStorage>) -> SessionManager {
    SessionManager::new(&config(server, AuthStrategy::BearerToken), storage.clone())
        .expect("Failed to build bearer manager")
}

pub fn cookie_manager(server: &MockServer, storage: &Arc<MemoryCredentialStorage>) -> SessionManager {
    SessionManager::new(&config(server, AuthStrategy::CookieSession), storage.clone())
        .expect("Failed to build cookie manager")
}

pub fn empty_storage() -> Arc<MemoryCredentialStorage> {
    Arc::new(MemoryCredentialStorage::new())
}

pub fn storage_with_token(token: &str) -> Arc<MemoryCredentialStorage> {
    Arc::new(MemoryCredentialStorage::with_entries(&[
        (AUTH_TOKEN_KEY, token),
        (AUTH_TOKEN_TYPE_KEY, "Bearer"),
    ]))
}

pub fn credentials() -> LoginCredentials {
    LoginCredentials::new(TEST_EMAIL, TEST_PASSWORD).expect("valid credentials")
}

pub fn user(id: u64) -> Value {
    json!({ "id": id, "name": format!("user-{id}") })
}

pub fn stored(storage: &MemoryCredentialStorage, key: &str) -> Option<String> {
    storage.get(key).expect("memory storage never fails")
}

/// `"METHOD /path"` for every request the server saw, in arrival order.
pub async fn request_log(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|request| format!("{} {}", request.method, request.url.path()))
        .collect()
}

pub fn cookie_manager_with_jar(
    server: &MockServer,
    storage: &Arc<MemoryCredentialStorage>,
    jar: &Arc<PersistentCookieJar>,
) -> SessionManager {
    SessionManager::with_cookie_jar(
        &config(server, AuthStrategy::CookieSession),
        storage.clone(),
        jar.clone(),
    )
    .expect("Failed to build cookie manager")
}

/// Put the backend's session cookie into `jar` as if a previous run had
/// signed in.
pub fn seed_session_cookie(server: &MockServer, jar: &PersistentCookieJar) {
    let url = Url::parse(&server.uri()).expect("server url");
    let header = HeaderValue::from_str(&format!("{SESSION_COOKIE}; Path=/")).expect("header");
    jar.set_cookies(&mut std::iter::once(&header), &url);
}

/// Matches requests whose `Cookie` header carries `pair` (`name=value`).
pub struct HasCookie(pub &'static str);

impl Match for HasCookie {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("cookie")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookies| cookies.split(';').any(|pair| pair.trim() == self.0))
    }
}

/// Cookie-session backend:
/// - priming sets `XSRF-TOKEN`
/// - login sets the session cookie
/// - `/me` answers only when the session cookie is presented, 401 otherwise
/// - logout succeeds
pub async fn mount_cookie_backend(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(ResponseTemplate::new(204).insert_header("Set-Cookie", "XSRF-TOKEN=t; Path=/"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", format!("{SESSION_COOKIE}; Path=/; HttpOnly").as_str())
                .set_body_json(json!({ "user": user(5) })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(HasCookie(SESSION_COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(5) })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}
