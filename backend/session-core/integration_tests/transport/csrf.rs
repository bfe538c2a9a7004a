use crate::helpers::{CSRF_PATH, cookie_manager, credentials, empty_storage, request_log, user};

use session_core::{SessionError, SessionPhase};

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_priming(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("Set-Cookie", format!("XSRF-TOKEN={token}; Path=/").as_str()),
        )
        .mount(server)
        .await;
}

/// **VALUE**: Verifies a cookie-strategy login primes CSRF first and echoes the
/// decoded cookie in the anti-forgery header.
///
/// **WHY THIS MATTERS**: Without the header the backend answers 419 and nobody
/// can sign in.
///
/// **BUG THIS CATCHES**: Would catch priming after (or without) the login call,
/// a header carrying the still-encoded cookie, or a token persisted in cookie
/// mode.
#[tokio::test]
async fn given_cookie_strategy_when_login_then_primed_first_and_header_echoed() {
    // GIVEN: A backend issuing an encoded CSRF cookie and requiring it back
    let server = MockServer::start().await;
    mount_priming(&server, "tok%3D123").await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("X-XSRF-TOKEN", "tok=123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(1) })))
        .expect(1)
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = cookie_manager(&server, &storage);

    // WHEN: Logging in
    let identity = manager.login(&credentials()).await.expect("login");

    // THEN: Should have primed before logging in
    assert_eq!(identity.id(), Some(&json!(1)));
    assert_eq!(
        request_log(&server).await,
        vec!["GET /sanctum/csrf-cookie", "POST /login"]
    );
    assert_eq!(manager.store().phase(), SessionPhase::Authenticated);
    assert!(storage.is_empty(), "Cookie strategy must not persist a token");
}

/// **VALUE**: Verifies a failed priming aborts the guarded request.
///
/// **WHY THIS MATTERS**: Sending the mutating call without a fresh token only
/// produces a confusing 419 from the backend.
///
/// **BUG THIS CATCHES**: Would catch if priming errors are ignored.
#[tokio::test]
async fn given_priming_failure_when_login_then_login_never_sent() {
    // GIVEN: A broken priming endpoint
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(1) })))
        .expect(0)
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = cookie_manager(&server, &storage);

    // WHEN: Logging in
    let error = manager.login(&credentials()).await.expect_err("should fail");

    // THEN: Should surface the priming failure and stay signed out
    assert!(matches!(error, SessionError::Server { .. }));
    assert!(!manager.store().is_authenticated());
    assert_eq!(
        manager.store().last_error().as_deref(),
        Some("Unable to sign in")
    );
}

/// **VALUE**: Verifies every concurrent mutating request gets its own completed
/// priming round-trip.
///
/// **WHY THIS MATTERS**: The backend rotates the token on each priming; sharing
/// one in-flight priming between requests sends stale tokens.
///
/// **BUG THIS CATCHES**: Would catch skipped or deduplicated primings, or a
/// guarded request overtaking its priming.
#[tokio::test]
async fn given_concurrent_guarded_posts_when_sent_then_each_preceded_by_priming() {
    // GIVEN: A priming endpoint and a mutating endpoint
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CSRF_PATH))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("Set-Cookie", "XSRF-TOKEN=t; Path=/")
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(header("X-XSRF-TOKEN", "t"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
        .expect(5)
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = Arc::new(cookie_manager(&server, &storage));

    // WHEN: Sending five guarded POSTs at once
    let mut tasks = Vec::new();
    for n in 0..5 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move {
            manager
                .guard()
                .guarded_request(Method::POST, "posts", Some(&json!({ "n": n })))
                .await
        }));
    }
    for task in tasks {
        task.await.expect("task").expect("guarded request");
    }

    // THEN: Should have one priming per request, each POST after at least as
    // many primings as POSTs seen so far
    let log = request_log(&server).await;
    let primes = log.iter().filter(|r| r.starts_with("GET ")).count();
    assert_eq!(primes, 5);

    let mut primed = 0;
    let mut posted = 0;
    for entry in &log {
        if entry.starts_with("GET ") {
            primed += 1;
        } else {
            posted += 1;
            assert!(
                posted <= primed,
                "POST #{posted} was sent before its priming: {log:?}"
            );
        }
    }
}

/// **VALUE**: Verifies safe methods skip priming.
///
/// **WHY THIS MATTERS**: Priming every read doubles latency for no protection.
///
/// **BUG THIS CATCHES**: Would catch an inverted method check.
#[tokio::test]
async fn given_get_request_when_guarded_then_no_priming() {
    // GIVEN: A read endpoint
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = cookie_manager(&server, &storage);

    // WHEN: Sending a guarded GET
    let body = manager
        .guard()
        .guarded_request(Method::GET, "posts", None)
        .await
        .expect("read");

    // THEN: Should only hit the read endpoint
    assert_eq!(body, json!([]));
    assert_eq!(request_log(&server).await, vec!["GET /posts"]);
}

/// **VALUE**: Verifies cookie-strategy logout is guarded like any other
/// mutating call.
///
/// **WHY THIS MATTERS**: An unguarded logout is rejected with 419, leaving the
/// server-side session alive.
///
/// **BUG THIS CATCHES**: Would catch logout bypassing the guard.
#[tokio::test]
async fn given_cookie_session_when_logout_then_primed_before_logout() {
    // GIVEN: A priming endpoint and a logout endpoint requiring the header
    let server = MockServer::start().await;
    mount_priming(&server, "abc").await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("X-XSRF-TOKEN", "abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = cookie_manager(&server, &storage);

    // WHEN: Logging out
    let outcome = manager.logout().await.expect("logout");

    // THEN: Should be confirmed after a priming round-trip
    assert!(outcome.is_confirmed());
    assert_eq!(
        request_log(&server).await,
        vec!["GET /me", "GET /sanctum/csrf-cookie", "POST /logout"]
    );
}
