use crate::helpers::{
    bearer_manager, config, cookie_manager, cookie_manager_with_jar, empty_storage,
    mount_cookie_backend, request_log, seed_session_cookie, storage_with_token, stored, user,
};

use session_core::storage::{
    AUTH_TOKEN_KEY, AUTH_TOKEN_TYPE_KEY, FileCredentialStorage, PersistentCookieJar,
};
use session_core::{AuthStrategy, SessionManager, SessionPhase};

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies a first launch with nothing persisted ends unauthenticated
/// without any network traffic.
///
/// **WHY THIS MATTERS**: Asking the backend "who am I" without a credential only
/// produces a 401 and a misleading warning on every cold start.
///
/// **BUG THIS CATCHES**: Would catch if bootstrap calls the identity endpoint
/// even when no token is stored.
#[tokio::test]
async fn given_no_persisted_token_when_bootstrapping_then_unauthenticated_without_request() {
    // GIVEN: A backend that must not be contacted
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(1) })))
        .expect(0)
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Bootstrapping
    let phase = manager.bootstrap().await;

    // THEN: Should be unauthenticated with no recorded error
    assert_eq!(phase, SessionPhase::Unauthenticated);
    let session = manager.store().snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_bootstrapping());
    assert_eq!(session.last_error(), None);
}

/// **VALUE**: Verifies a persisted token the backend accepts restores the session.
///
/// **WHY THIS MATTERS**: Users expect to stay signed in across restarts.
///
/// **BUG THIS CATCHES**: Would catch if the stored token is not attached before
/// the identity call, or if the `user` field is not read from the response.
#[tokio::test]
async fn given_valid_persisted_token_when_bootstrapping_then_authenticated() {
    // GIVEN: A stored token the backend recognizes
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(7) })))
        .expect(1)
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);

    // WHEN: Bootstrapping
    let phase = manager.bootstrap().await;

    // THEN: Should be authenticated as the returned user
    assert_eq!(phase, SessionPhase::Authenticated);
    let identity = manager.store().identity().expect("identity after bootstrap");
    assert_eq!(identity.id(), Some(&json!(7)));
    assert!(manager.client().has_auth_token().await);
}

/// **VALUE**: Verifies an expired token is discarded during bootstrap.
///
/// **WHY THIS MATTERS**: Keeping a rejected token means every later call fails
/// with 401 and the user can never recover without deleting files by hand.
///
/// **BUG THIS CATCHES**: Would catch if a 401 leaves the token in storage or
/// attached to the client, or if the failure leaks into `last_error`.
#[tokio::test]
async fn given_expired_token_when_bootstrapping_then_token_cleared() {
    // GIVEN: A stored token the backend rejects
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthenticated." })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let storage = storage_with_token("expired");
    let manager = bearer_manager(&server, &storage);

    // WHEN: Bootstrapping
    let phase = manager.bootstrap().await;

    // THEN: Should end unauthenticated with storage and header cleared
    assert_eq!(phase, SessionPhase::Unauthenticated);
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
    assert_eq!(stored(&storage, AUTH_TOKEN_TYPE_KEY), None);
    assert!(!manager.client().has_auth_token().await);
    assert_eq!(manager.store().last_error(), None);
}

/// **VALUE**: Verifies bootstrap hits the backend at most once per manager.
///
/// **WHY THIS MATTERS**: Several components may await bootstrap on startup;
/// repeating the identity call multiplies load and can flip state mid-session.
///
/// **BUG THIS CATCHES**: Would catch if the once-only guard is missing or if
/// concurrent callers each run their own recovery.
#[tokio::test]
async fn given_concurrent_bootstrap_calls_when_awaited_then_identity_fetched_once() {
    // GIVEN: A slow identity endpoint
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(1) }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);

    // WHEN: Bootstrapping three times, concurrently and then again
    let (first, second) = tokio::join!(manager.bootstrap(), manager.bootstrap());
    let third = manager.bootstrap().await;

    // THEN: All should agree and only one request should reach the backend
    assert_eq!(first, SessionPhase::Authenticated);
    assert_eq!(second, SessionPhase::Authenticated);
    assert_eq!(third, SessionPhase::Authenticated);
    assert_eq!(request_log(&server).await, vec!["GET /me"]);
}

/// **VALUE**: Verifies a hanging backend cannot keep the app in `Bootstrapping`.
///
/// **WHY THIS MATTERS**: The UI shows a splash screen while bootstrapping; an
/// unbounded wait leaves the user staring at it forever.
///
/// **BUG THIS CATCHES**: Would catch if the bootstrap timeout is not applied or
/// if a timed-out bootstrap keeps the stale token.
#[tokio::test]
async fn given_unresponsive_backend_when_bootstrapping_then_times_out_unauthenticated() {
    // GIVEN: An identity endpoint slower than the bootstrap timeout
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(1) }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let mut config = config(&server, AuthStrategy::BearerToken);
    config.auth.bootstrap_timeout_ms = 100;
    let manager = SessionManager::new(&config, storage.clone()).expect("manager");

    // WHEN: Bootstrapping
    let started = Instant::now();
    let phase = manager.bootstrap().await;

    // THEN: Should give up quickly and discard the unverified token
    assert_eq!(phase, SessionPhase::Unauthenticated);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "Bootstrap should stop at the timeout, took {:?}",
        started.elapsed()
    );
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
}

/// **VALUE**: Verifies `start` reports `Bootstrapping` immediately and resolves
/// in the background.
///
/// **WHY THIS MATTERS**: Route guards read the phase right after startup; seeing
/// `Uninitialized` or `Unauthenticated` first would bounce users to sign-in.
///
/// **BUG THIS CATCHES**: Would catch if `start` forgets to mark bootstrapping
/// before spawning, or never spawns the bootstrap task.
#[tokio::test]
async fn given_started_manager_when_observing_store_then_bootstrapping_then_resolved() {
    // GIVEN: A backend that accepts the stored token after a short delay
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(3) }))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let config = config(&server, AuthStrategy::BearerToken);

    // WHEN: Starting the manager
    let manager = SessionManager::start(&config, storage.clone()).expect("manager");

    // THEN: Should be bootstrapping right away
    assert_eq!(manager.store().phase(), SessionPhase::Bootstrapping);

    // AND: Should resolve to authenticated without further calls
    let mut updates = manager.store().subscribe();
    let resolved = tokio::time::timeout(
        Duration::from_secs(2),
        updates.wait_for(|session| !session.is_bootstrapping()),
    )
    .await
    .expect("bootstrap should finish")
    .expect("store sender alive")
    .clone();
    assert!(resolved.is_authenticated());
    assert_eq!(resolved.phase(), SessionPhase::Authenticated);
}

/// **VALUE**: Verifies the cookie strategy recovers a session from the cookies
/// already in its jar, with a plain GET and no CSRF priming.
///
/// **WHY THIS MATTERS**: The session cookie is the only credential of this
/// strategy; if it is not presented the backend has no idea who we are.
/// Reads are not guarded, so priming here would only add latency.
///
/// **BUG THIS CATCHES**: Would catch the jar not being wired into the client,
/// or the identity call being treated as a mutating request.
#[tokio::test]
async fn given_cookie_jar_with_session_when_bootstrapping_then_authenticated_without_priming() {
    // GIVEN: A backend that only recognizes its session cookie, and a jar
    // holding it
    let server = MockServer::start().await;
    mount_cookie_backend(&server).await;
    let storage = empty_storage();
    let jar = Arc::new(PersistentCookieJar::in_memory());
    seed_session_cookie(&server, &jar);
    let manager = cookie_manager_with_jar(&server, &storage, &jar);

    // WHEN: Bootstrapping
    let phase = manager.bootstrap().await;

    // THEN: Should be authenticated after a single GET
    assert_eq!(phase, SessionPhase::Authenticated);
    assert_eq!(request_log(&server).await, vec!["GET /me"]);
    assert!(storage.is_empty(), "Cookie strategy must not persist a token");
}

/// **VALUE**: Verifies an empty jar bootstraps to unauthenticated.
///
/// **BUG THIS CATCHES**: Would catch a cookie backend that answers `/me`
/// regardless of cookies hiding a broken jar in the test above.
#[tokio::test]
async fn given_empty_cookie_jar_when_bootstrapping_then_unauthenticated() {
    // GIVEN: A cookie backend and no cookies
    let server = MockServer::start().await;
    mount_cookie_backend(&server).await;
    let storage = empty_storage();
    let manager = cookie_manager(&server, &storage);

    // WHEN: Bootstrapping
    let phase = manager.bootstrap().await;

    // THEN: Should be unauthenticated without recording an error
    assert_eq!(phase, SessionPhase::Unauthenticated);
    assert_eq!(manager.store().last_error(), None);
}

/// **VALUE**: Verifies a cookie session established by one manager is
/// recovered by the next one reading the same cookie file.
///
/// **WHY THIS MATTERS**: `sessionctl login` followed by `sessionctl status` is
/// two processes; without a durable jar the second always reports signed out.
///
/// **BUG THIS CATCHES**: Would catch cookies kept only in memory, session
/// cookies without an expiry being dropped on save, or login not saving.
#[tokio::test]
async fn given_cookie_login_when_restarting_with_same_cookie_file_then_session_recovered() {
    // GIVEN: A signed-in cookie session saved to disk
    let server = MockServer::start().await;
    mount_cookie_backend(&server).await;
    let temp = TempDir::new().expect("temp dir");
    let cookies_file = temp.path().join("cookies.json");
    let storage = empty_storage();

    let first_jar = Arc::new(PersistentCookieJar::load(&cookies_file));
    let first = cookie_manager_with_jar(&server, &storage, &first_jar);
    first
        .login(&crate::helpers::credentials())
        .await
        .expect("login");
    drop(first);
    assert!(cookies_file.exists(), "Login should save the cookie jar");

    // WHEN: A new manager bootstraps from the same file
    let second_jar = Arc::new(PersistentCookieJar::load(&cookies_file));
    let second = cookie_manager_with_jar(&server, &storage, &second_jar);
    let phase = second.bootstrap().await;

    // THEN: Should be authenticated as the same user
    assert_eq!(phase, SessionPhase::Authenticated);
    assert_eq!(
        second.store().identity().and_then(|i| i.id().cloned()),
        Some(json!(5))
    );
}

/// **VALUE**: Verifies logout removes the saved session cookie.
///
/// **WHY THIS MATTERS**: On a shared machine the next run must not come back
/// signed in after the user signed out.
///
/// **BUG THIS CATCHES**: Would catch logout clearing the store but leaving the
/// cookie file behind.
#[tokio::test]
async fn given_cookie_logout_when_restarting_with_same_cookie_file_then_signed_out() {
    // GIVEN: A cookie session that signed in and then out
    let server = MockServer::start().await;
    mount_cookie_backend(&server).await;
    let temp = TempDir::new().expect("temp dir");
    let cookies_file = temp.path().join("cookies.json");
    let storage = empty_storage();

    let first_jar = Arc::new(PersistentCookieJar::load(&cookies_file));
    let first = cookie_manager_with_jar(&server, &storage, &first_jar);
    first
        .login(&crate::helpers::credentials())
        .await
        .expect("login");
    assert!(first.logout().await.expect("logout").is_confirmed());
    drop(first);

    // WHEN: A new manager bootstraps from the same file
    let second_jar = Arc::new(PersistentCookieJar::load(&cookies_file));
    assert!(second_jar.is_empty());
    let second = cookie_manager_with_jar(&server, &storage, &second_jar);
    let phase = second.bootstrap().await;

    // THEN: Should stay signed out
    assert_eq!(phase, SessionPhase::Unauthenticated);
}

/// **VALUE**: Verifies a token persisted to disk by one manager is recovered by
/// the next one.
///
/// **WHY THIS MATTERS**: This is the restart path of the command-line client.
///
/// **BUG THIS CATCHES**: Would catch a mismatch between what login writes and
/// what bootstrap reads, or a file storage that never flushes.
#[tokio::test]
async fn given_file_storage_when_restarting_then_session_recovered() {
    // GIVEN: A backend issuing and accepting a token, and on-disk storage
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user(9),
            "token": "disk-token",
            "token_type": "Bearer",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer disk-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(9) })))
        .mount(&server)
        .await;
    let temp = TempDir::new().expect("temp dir");
    let credentials_file = temp.path().join("credentials.json");
    let config = config(&server, AuthStrategy::BearerToken);

    let first = SessionManager::new(
        &config,
        Arc::new(FileCredentialStorage::new(&credentials_file)),
    )
    .expect("first manager");
    first
        .login(&crate::helpers::credentials())
        .await
        .expect("login");
    drop(first);

    // WHEN: A new manager bootstraps from the same file
    let second = SessionManager::new(
        &config,
        Arc::new(FileCredentialStorage::new(&credentials_file)),
    )
    .expect("second manager");
    let phase = second.bootstrap().await;

    // THEN: Should be authenticated as the same user
    assert_eq!(phase, SessionPhase::Authenticated);
    assert_eq!(
        second.store().identity().and_then(|i| i.id().cloned()),
        Some(json!(9))
    );
}
