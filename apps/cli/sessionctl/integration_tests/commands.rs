use sessionctl::cli::Command;
use sessionctl::commands::execute;
use sessionctl::error::CliError;

use session_core::storage::{
    AUTH_TOKEN_KEY, AUTH_TOKEN_TYPE_KEY, CredentialStorage, MemoryCredentialStorage,
};
use session_core::{AuthStrategy, SessionConfig, SessionManager};

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server: &MockServer, storage: &Arc<MemoryCredentialStorage>) -> Arc<SessionManager> {
    let config = SessionConfig::for_endpoint(server.uri(), AuthStrategy::BearerToken);
    Arc::new(SessionManager::new(&config, storage.clone()).expect("manager"))
}

fn signed_in_storage() -> Arc<MemoryCredentialStorage> {
    Arc::new(MemoryCredentialStorage::with_entries(&[
        (AUTH_TOKEN_KEY, "abc"),
        (AUTH_TOKEN_TYPE_KEY, "Bearer"),
    ]))
}

async fn mount_me(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "user": { "id": 1, "email": "a@b.com" } })),
        )
        .mount(server)
        .await;
}

/// **VALUE**: Verifies `status` reports a recovered session with the user.
///
/// **BUG THIS CATCHES**: Would catch the command skipping bootstrap.
#[tokio::test]
async fn given_stored_token_when_status_then_reports_authenticated_user() {
    // GIVEN: A stored token the backend accepts
    let server = MockServer::start().await;
    mount_me(&server).await;
    let storage = signed_in_storage();

    // WHEN: Running status
    let output = execute(&Command::Status, manager(&server, &storage))
        .await
        .unwrap();

    // THEN: Should name the user
    assert_eq!(output, "authenticated as a@b.com");
}

#[tokio::test]
async fn given_no_stored_token_when_status_then_reports_unauthenticated() {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryCredentialStorage::new());

    let output = execute(&Command::Status, manager(&server, &storage))
        .await
        .unwrap();

    assert_eq!(output, "unauthenticated");
}

/// **VALUE**: Verifies `login` signs in and persists the token.
///
/// **WHY THIS MATTERS**: The next `sessionctl` invocation must find the session.
///
/// **BUG THIS CATCHES**: Would catch the command printing success without the
/// token reaching storage.
#[tokio::test]
async fn given_valid_credentials_when_login_then_signed_in_and_persisted() {
    // GIVEN: A backend issuing a token
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 1, "email": "a@b.com" },
            "token": "abc",
        })))
        .mount(&server)
        .await;
    let storage = Arc::new(MemoryCredentialStorage::new());
    let command = Command::Login {
        email: "a@b.com".to_string(),
        password: "x".to_string(),
    };

    // WHEN: Running login
    let output = execute(&command, manager(&server, &storage)).await.unwrap();

    // THEN: Should report and persist the session
    assert_eq!(output, "Signed in as a@b.com");
    assert_eq!(
        storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(),
        Some("abc")
    );
}

/// **VALUE**: Verifies a rejected login surfaces the backend's message.
///
/// **BUG THIS CATCHES**: Would catch the CLI printing a raw error chain instead
/// of the message the user can act on.
#[tokio::test]
async fn given_invalid_credentials_when_login_then_backend_message_returned() {
    // GIVEN: A backend rejecting the credentials
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;
    let storage = Arc::new(MemoryCredentialStorage::new());
    let command = Command::Login {
        email: "a@b.com".to_string(),
        password: "wrong".to_string(),
    };

    // WHEN: Running login
    let error = execute(&command, manager(&server, &storage))
        .await
        .unwrap_err();

    // THEN: Should carry the backend message
    match error {
        CliError::Session { message, .. } => assert_eq!(message, "Invalid credentials"),
        other => panic!("Expected Session error, got {:?}", other),
    }
}

/// **VALUE**: Verifies `logout` still succeeds locally when the backend fails.
///
/// **BUG THIS CATCHES**: Would catch the command failing (and the user staying
/// signed in) because the server was down.
#[tokio::test]
async fn given_backend_failure_when_logout_then_signed_out_locally() {
    // GIVEN: A recovered session and a failing logout endpoint
    let server = MockServer::start().await;
    mount_me(&server).await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let storage = signed_in_storage();

    // WHEN: Running logout
    let output = execute(&Command::Logout, manager(&server, &storage))
        .await
        .unwrap();

    // THEN: Should report the local-only outcome and clear storage
    assert_eq!(output, "Signed out locally (backend logout failed: server_error)");
    assert!(storage.is_empty());
}

/// **VALUE**: Verifies `whoami` prints the identity as JSON.
///
/// **BUG THIS CATCHES**: Would catch identity fields being dropped or wrapped.
#[tokio::test]
async fn given_stored_token_when_whoami_then_prints_identity_json() {
    // GIVEN: A recovered session
    let server = MockServer::start().await;
    mount_me(&server).await;
    let storage = signed_in_storage();

    // WHEN: Running whoami
    let output = execute(&Command::Whoami, manager(&server, &storage))
        .await
        .unwrap();

    // THEN: Should print the user object
    let printed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(printed, json!({ "id": 1, "email": "a@b.com" }));
}

#[tokio::test]
async fn given_no_session_when_whoami_then_not_signed_in() {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryCredentialStorage::new());

    let error = execute(&Command::Whoami, manager(&server, &storage))
        .await
        .unwrap_err();

    assert!(matches!(error, CliError::NotSignedIn { .. }));
}
