use crate::helpers::{bearer_manager, credentials, empty_storage, user};

use session_core::{FacadeStatus, SessionFacade};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn facade_for(server: &MockServer) -> SessionFacade {
    let storage = empty_storage();
    SessionFacade::new(Arc::new(bearer_manager(server, &storage)))
}

/// **VALUE**: Verifies the facade surfaces the backend's validation message.
///
/// **WHY THIS MATTERS**: This is the text the sign-in form shows under the
/// password field.
///
/// **BUG THIS CATCHES**: Would catch if the facade shows its fallback even
/// when the backend explained the failure.
#[tokio::test]
async fn given_invalid_credentials_when_signing_in_then_backend_message_shown() {
    // GIVEN: A backend rejecting the credentials
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;
    let facade = facade_for(&server);

    // WHEN: Signing in
    let result = facade.sign_in(&credentials()).await;

    // THEN: Should fail with the message recorded and loading cleared
    assert!(result.is_err());
    assert_eq!(
        facade.status(),
        FacadeStatus {
            loading: false,
            error: Some("Invalid credentials".to_string()),
        }
    );
    assert!(!facade.is_authenticated());
    assert_eq!(facade.user(), None);
}

/// **VALUE**: Verifies a failure without a message falls back to a fixed text.
///
/// **WHY THIS MATTERS**: An empty error banner after a failed sign-in looks like
/// nothing happened.
///
/// **BUG THIS CATCHES**: Would catch a missing fallback for non-JSON bodies.
#[tokio::test]
async fn given_unexplained_failure_when_signing_in_then_fallback_shown() {
    // GIVEN: A backend failing without a JSON body
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;
    let facade = facade_for(&server);

    // WHEN: Signing in
    facade.sign_in(&credentials()).await.expect_err("should fail");

    // THEN: Should show the fallback
    assert_eq!(facade.error().as_deref(), Some("Unable to sign in"));
    assert!(!facade.is_loading());
}

/// **VALUE**: Verifies `loading` is raised for the duration of the call and the
/// previous error is reset at its start.
///
/// **WHY THIS MATTERS**: The form disables the submit button while loading and
/// must not keep showing the last attempt's error during a retry.
///
/// **BUG THIS CATCHES**: Would catch a loading flag that is never raised, never
/// lowered, or an error that survives into the next attempt.
#[tokio::test]
async fn given_retry_after_failure_when_signing_in_then_loading_raised_and_error_reset() {
    // GIVEN: One rejected attempt followed by a slow successful one
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
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(4), "token": "abc" }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    let facade = facade_for(&server);
    facade.sign_in(&credentials()).await.expect_err("first attempt fails");
    assert!(facade.error().is_some());

    // WHEN: Retrying in the background
    let pending = tokio::spawn({
        let facade = facade.clone();
        async move { facade.sign_in(&credentials()).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // THEN: Should be loading with the old error gone
    assert_eq!(
        facade.status(),
        FacadeStatus {
            loading: true,
            error: None,
        }
    );

    // AND: Should settle on success
    let identity = pending.await.expect("task").expect("sign in");
    assert_eq!(facade.user(), Some(identity));
    assert_eq!(facade.status(), FacadeStatus::default());
}

/// **VALUE**: Verifies a backend logout failure is not shown as a sign-out error.
///
/// **WHY THIS MATTERS**: The user is signed out locally either way; an error
/// banner would suggest otherwise.
///
/// **BUG THIS CATCHES**: Would catch if `LocalOnly` outcomes are recorded as
/// facade errors.
#[tokio::test]
async fn given_backend_logout_failure_when_signing_out_then_no_error_shown() {
    // GIVEN: A failing logout endpoint
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let facade = facade_for(&server);

    // WHEN: Signing out
    let outcome = facade.sign_out().await.expect("local sign-out");

    // THEN: Should report a local-only sign-out without an error banner
    assert!(!outcome.is_confirmed());
    assert_eq!(facade.error(), None);
    assert!(!facade.is_loading());
    assert!(!facade.is_authenticated());
}

/// **VALUE**: Verifies `loading` stays raised while any call is still running.
///
/// **WHY THIS MATTERS**: A form that re-enables its submit button while a
/// sign-in is still pending invites a third submission.
///
/// **BUG THIS CATCHES**: Would catch the first call to finish lowering
/// `loading` for everyone.
#[tokio::test]
async fn given_overlapping_sign_ins_when_first_finishes_then_still_loading() {
    // GIVEN: Two slow login responses
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(1), "token": "abc" }))
                .set_delay(Duration::from_millis(300)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "message": "Invalid credentials" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let facade = facade_for(&server);

    // WHEN: Starting a second sign-in while the first is pending
    let first = tokio::spawn({
        let facade = facade.clone();
        async move { facade.sign_in(&credentials()).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = tokio::spawn({
        let facade = facade.clone();
        async move { facade.sign_in(&credentials()).await }
    });
    first.await.expect("first task").expect("first sign in");

    // THEN: Should still be loading for the second call
    assert!(facade.is_loading(), "Second sign-in is still in flight");

    // AND: Should lower loading once the second call ends
    second.await.expect("second task").expect_err("second sign in fails");
    assert!(!facade.is_loading());
    assert_eq!(facade.error().as_deref(), Some("Invalid credentials"));
}
