use crate::helpers::{bearer_manager, config, request_log, storage_with_token, stored, user};

use session_core::storage::AUTH_TOKEN_KEY;
use session_core::{AuthStrategy, LogoutOutcome, SessionError, SessionManager, SessionPhase};

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn authenticated_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(1) })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    server
}

/// **VALUE**: Verifies an acknowledged logout clears everything and reports
/// `Confirmed`.
///
/// **WHY THIS MATTERS**: The backend must see the credential to revoke it, and
/// the client must forget it afterwards.
///
/// **BUG THIS CATCHES**: Would catch if the token is dropped before the logout
/// call is sent, or kept after it succeeds.
#[tokio::test]
async fn given_authenticated_session_when_logout_succeeds_then_confirmed_and_cleared() {
    // GIVEN: A recovered session and a backend accepting logout
    let server = authenticated_server().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);
    assert_eq!(manager.bootstrap().await, SessionPhase::Authenticated);

    // WHEN: Logging out
    let outcome = manager.logout().await.expect("logout");

    // THEN: Should be confirmed with local state cleared
    assert!(outcome.is_confirmed());
    assert_eq!(manager.store().phase(), SessionPhase::Unauthenticated);
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
    assert!(!manager.client().has_auth_token().await);
}

/// **VALUE**: Verifies a failing backend logout still signs the user out locally.
///
/// **WHY THIS MATTERS**: A user pressing "sign out" on a shared machine must not
/// stay signed in because the server is down.
///
/// **BUG THIS CATCHES**: Would catch if the remote error aborts the local clear,
/// or if the failure is swallowed instead of reported as `LocalOnly`.
#[tokio::test]
async fn given_backend_error_when_logout_then_local_only_and_cleared() {
    // GIVEN: A recovered session and a failing logout endpoint
    let server = authenticated_server().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);
    manager.bootstrap().await;

    // WHEN: Logging out
    let outcome = manager.logout().await.expect("local clear should succeed");

    // THEN: Should report the remote failure
    match outcome {
        LogoutOutcome::LocalOnly(SessionError::Server { message, .. }) => {
            assert_eq!(message.as_deref(), Some("boom"));
        }
        other => panic!("Expected LocalOnly server error, got {:?}", other),
    }

    // AND: Should still clear everything locally
    assert!(!manager.store().is_authenticated());
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
    assert!(!manager.client().has_auth_token().await);
}

/// **VALUE**: Verifies an identity refresh rejected with 401 ends the session.
///
/// **WHY THIS MATTERS**: Tokens can be revoked server-side at any time; the
/// client must notice and stop presenting itself as signed in.
///
/// **BUG THIS CATCHES**: Would catch if a 401 during refresh leaves the old
/// identity or token in place.
#[tokio::test]
async fn given_revoked_token_when_refreshing_identity_then_session_cleared() {
    // GIVEN: A session that the backend revokes after bootstrap
    let server = authenticated_server().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);
    assert_eq!(manager.bootstrap().await, SessionPhase::Authenticated);

    // WHEN: Refreshing the identity
    let error = manager.refresh_identity().await.expect_err("refresh should fail");

    // THEN: Should report unauthorized and clear the session
    assert!(error.is_unauthorized());
    assert_eq!(manager.store().phase(), SessionPhase::Unauthenticated);
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
    assert_eq!(request_log(&server).await, vec!["GET /me", "GET /me"]);
}

/// **VALUE**: Verifies a transient refresh failure leaves the session alone.
///
/// **WHY THIS MATTERS**: A flaky network must not sign users out.
///
/// **BUG THIS CATCHES**: Would catch if every refresh error clears the session.
#[tokio::test]
async fn given_server_error_when_refreshing_identity_then_session_kept() {
    // GIVEN: A session whose next identity call fails with 503
    let server = authenticated_server().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);
    manager.bootstrap().await;

    // WHEN: Refreshing the identity
    let error = manager.refresh_identity().await.expect_err("refresh should fail");

    // THEN: Should keep the session and token
    assert!(matches!(error, SessionError::Server { .. }));
    assert!(manager.store().is_authenticated());
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY).as_deref(), Some("abc"));
}

/// **VALUE**: Verifies `clear_session` drops local state without any request.
///
/// **WHY THIS MATTERS**: Applications call it when they already know the session
/// is dead (for example after a global 401 handler fires).
///
/// **BUG THIS CATCHES**: Would catch if clearing contacts the backend or leaves
/// the token persisted.
#[tokio::test]
async fn given_authenticated_session_when_clearing_then_no_request_sent() {
    // GIVEN: A recovered session
    let server = authenticated_server().await;
    let storage = storage_with_token("abc");
    let manager = bearer_manager(&server, &storage);
    manager.bootstrap().await;

    // WHEN: Clearing locally
    manager.clear_session().await.expect("clear");

    // THEN: Should be signed out with only the bootstrap request on record
    assert!(!manager.store().is_authenticated());
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
    assert_eq!(request_log(&server).await, vec!["GET /me"]);
}

/// **VALUE**: Verifies a clear requested right after `start` is not undone by
/// the background bootstrap.
///
/// **WHY THIS MATTERS**: A global 401 handler can fire before bootstrap has
/// resolved; a late bootstrap must not sign the user back in.
///
/// **BUG THIS CATCHES**: Would catch `clear_session` taking the transition
/// lock before bootstrap has run.
#[tokio::test]
async fn given_started_manager_when_clearing_before_bootstrap_resolves_then_stays_cleared() {
    // GIVEN: A stored token the backend accepts after a delay
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(1) }))
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;
    let storage = storage_with_token("abc");
    let manager = SessionManager::start(&config(&server, AuthStrategy::BearerToken), storage.clone())
        .expect("manager");

    // WHEN: Clearing immediately
    manager.clear_session().await.expect("clear");
    tokio::time::sleep(Duration::from_millis(150)).await;

    // THEN: Should stay signed out with the token gone
    assert_eq!(manager.store().phase(), SessionPhase::Unauthenticated);
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY), None);
    assert_eq!(request_log(&server).await, vec!["GET /me"]);
}
