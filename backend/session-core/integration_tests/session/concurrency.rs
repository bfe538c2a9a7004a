use crate::helpers::{bearer_manager, credentials, empty_storage, request_log, stored, user};

use session_core::storage::AUTH_TOKEN_KEY;
use session_core::SessionManager;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn assert_consistent(manager: &SessionManager, token: Option<String>) {
    assert_eq!(
        token.is_some(),
        manager.store().is_authenticated(),
        "Persisted token and published identity must agree"
    );
}

/// **VALUE**: Verifies a logout issued while a login is in flight is applied
/// after it, leaving a consistent signed-out session.
///
/// **WHY THIS MATTERS**: Double clicks and impatient users produce exactly this
/// race; interleaving could persist a token for a session the UI shows as
/// signed out.
///
/// **BUG THIS CATCHES**: Would catch if transitions are not serialized.
#[tokio::test]
async fn given_login_in_flight_when_logout_requested_then_applied_in_order() {
    // GIVEN: A slow login and an instant logout
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(1), "token": "abc" }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = Arc::new(bearer_manager(&server, &storage));

    // WHEN: Logging out shortly after the login starts
    let login = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.login(&credentials()).await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    let logout = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.logout().await }
    });

    let login = login.await.expect("login task");
    let logout = logout.await.expect("logout task");

    // THEN: Both should complete, in order, ending signed out
    assert!(login.is_ok());
    assert!(logout.expect("logout").is_confirmed());
    assert_eq!(
        request_log(&server).await,
        vec!["POST /login", "POST /logout"]
    );
    assert!(!manager.store().is_authenticated());
    assert_consistent(&manager, stored(&storage, AUTH_TOKEN_KEY));
}

/// **VALUE**: Verifies concurrent logins leave storage and store in agreement.
///
/// **WHY THIS MATTERS**: The persisted token must always belong to the
/// published session.
///
/// **BUG THIS CATCHES**: Would catch interleaved persist/publish steps across
/// two logins.
#[tokio::test]
async fn given_concurrent_logins_when_both_finish_then_state_consistent() {
    // GIVEN: A backend accepting every login
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": user(1), "token": "abc" }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&server)
        .await;
    let storage = empty_storage();
    let manager = bearer_manager(&server, &storage);

    // WHEN: Logging in twice at once
    let creds = credentials();
    let (first, second) = tokio::join!(manager.login(&creds), manager.login(&creds));

    // THEN: Both succeed and the state is coherent
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(manager.store().is_authenticated());
    assert_consistent(&manager, stored(&storage, AUTH_TOKEN_KEY));
}
