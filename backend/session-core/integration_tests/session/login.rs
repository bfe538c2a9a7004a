use crate::helpers::{
    TEST_EMAIL, TEST_PASSWORD, bearer_manager, credentials, empty_storage, request_log, stored,
    user,
};

use session_core::storage::{AUTH_TOKEN_KEY, AUTH_TOKEN_TYPE_KEY};
use session_core::{SessionError, SessionPhase};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: Verifies a successful bearer login persists the token pair,
/// attaches it and publishes the identity.
///
/// **WHY THIS MATTERS**: Every later request depends on the token being both on
/// disk (for restarts) and on the client (for this run).
///
/// **BUG THIS CATCHES**: Would catch a token persisted without its type, a
/// token never attached to the client, or credentials sent in the wrong shape.
#[tokio::test]
async fn given_bearer_strategy_when_login_succeeds_then_token_persisted_and_attached() {
    // GIVEN: A backend that accepts the credentials and issues a token
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user(1),
            "token": "abc",
            "token_type": "Bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(1) })))
        .expect(1)
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Logging in
    let identity = manager.login(&credentials()).await.expect("login");

    // THEN: Should persist both entries and publish the identity
    assert_eq!(identity.id(), Some(&json!(1)));
    assert_eq!(stored(&storage, AUTH_TOKEN_KEY).as_deref(), Some("abc"));
    assert_eq!(stored(&storage, AUTH_TOKEN_TYPE_KEY).as_deref(), Some("Bearer"));
    assert_eq!(manager.store().phase(), SessionPhase::Authenticated);
    assert_eq!(manager.store().last_error(), None);

    // AND: Should attach the token to later requests
    let refreshed = manager.refresh_identity().await.expect("refresh");
    assert_eq!(refreshed, Some(identity));

    // AND: Should not prime CSRF in bearer mode
    assert_eq!(request_log(&server).await, vec!["POST /login", "GET /me"]);
}

/// **VALUE**: Verifies a missing `token_type` defaults to `Bearer`.
///
/// **WHY THIS MATTERS**: Some backends only send the token; a blank type would
/// produce an `Authorization` header the backend cannot parse.
///
/// **BUG THIS CATCHES**: Would catch if the default type is not applied before
/// persisting.
#[tokio::test]
async fn given_login_response_without_token_type_when_login_then_defaults_to_bearer() {
    // GIVEN: A login response without a token type
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": user(2), "token": "t" })),
        )
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Logging in
    manager.login(&credentials()).await.expect("login");

    // THEN: Should persist the default type
    assert_eq!(stored(&storage, AUTH_TOKEN_TYPE_KEY).as_deref(), Some("Bearer"));
}

/// **VALUE**: Verifies a 422 keeps the user unauthenticated and surfaces the
/// backend's message.
///
/// **WHY THIS MATTERS**: The sign-in form shows `last_error` verbatim; a generic
/// message hides which field was wrong.
///
/// **BUG THIS CATCHES**: Would catch if validation failures are classified as
/// server errors, if the message is dropped, or if a token is persisted anyway.
#[tokio::test]
async fn given_invalid_credentials_when_login_then_validation_error_recorded() {
    // GIVEN: A backend rejecting the credentials
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Logging in
    let result = manager.login(&credentials()).await;

    // THEN: Should return a validation error carrying the message
    match result {
        Err(SessionError::Validation { status, message, .. }) => {
            assert_eq!(status.0, 422);
            assert_eq!(message.as_deref(), Some("Invalid credentials"));
        }
        other => panic!("Expected Validation error, got {:?}", other),
    }

    // AND: Should stay unauthenticated with the message recorded
    assert_eq!(manager.store().phase(), SessionPhase::Unauthenticated);
    assert_eq!(
        manager.store().last_error().as_deref(),
        Some("Invalid credentials")
    );
    assert!(storage.is_empty());
}

/// **VALUE**: Verifies a failure without a backend message records the fallback.
///
/// **WHY THIS MATTERS**: The form must always show something after a failed
/// attempt, even when the backend returns an HTML error page.
///
/// **BUG THIS CATCHES**: Would catch an empty or missing `last_error` when the
/// body is not JSON.
#[tokio::test]
async fn given_server_error_without_message_when_login_then_fallback_recorded() {
    // GIVEN: A backend failing with a non-JSON body
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Logging in
    let error = manager.login(&credentials()).await.expect_err("should fail");

    // THEN: Should classify as a server error and record the fallback
    assert!(matches!(error, SessionError::Server { .. }));
    assert_eq!(
        manager.store().last_error().as_deref(),
        Some("Unable to sign in")
    );
}

/// **VALUE**: Verifies a bearer login whose response lacks a token fails cleanly.
///
/// **WHY THIS MATTERS**: Publishing an identity without a credential would show
/// the user as signed in while every request fails.
///
/// **BUG THIS CATCHES**: Would catch if the identity is published before the
/// token is validated.
#[tokio::test]
async fn given_login_response_without_token_when_bearer_login_then_decode_error() {
    // GIVEN: A login response with a user but no token
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user(1) })))
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Logging in
    let error = manager.login(&credentials()).await.expect_err("should fail");

    // THEN: Should report a decode error and keep the session empty
    assert!(matches!(error, SessionError::Decode { .. }));
    assert!(!manager.store().is_authenticated());
    assert!(storage.is_empty());
    assert!(!manager.client().has_auth_token().await);
}

/// **VALUE**: Verifies a successful login clears the error left by a failed one.
///
/// **WHY THIS MATTERS**: A stale error banner after signing in looks like the
/// sign-in failed.
///
/// **BUG THIS CATCHES**: Would catch if `SignedIn` does not reset `last_error`.
#[tokio::test]
async fn given_failed_then_successful_login_when_checking_state_then_error_cleared() {
    // GIVEN: A backend that rejects once and then accepts
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": user(1), "token": "abc" })),
        )
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);
    manager.login(&credentials()).await.expect_err("first attempt fails");
    assert!(manager.store().last_error().is_some());

    // WHEN: Logging in again
    manager.login(&credentials()).await.expect("second attempt");

    // THEN: Should be authenticated with no error
    assert!(manager.store().is_authenticated());
    assert_eq!(manager.store().last_error(), None);
}
