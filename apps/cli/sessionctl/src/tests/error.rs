use crate::error::CliError;

use models::LoginCredentials;
use session_core::SessionError;

/// **VALUE**: Verifies a backend message is what the user sees.
///
/// **WHY THIS MATTERS**: "Invalid credentials" is actionable; the full error
/// chain with HTTP status and location is not.
///
/// **BUG THIS CATCHES**: Would catch if the conversion drops the server message.
#[test]
fn given_session_error_with_message_when_converted_then_message_kept() {
    // GIVEN: A 422 with a message
    let error = SessionError::from_response(422, r#"{"message":"Invalid credentials"}"#);

    // WHEN: Converting
    let cli: CliError = error.into();

    // THEN: Should carry only the backend message
    match cli {
        CliError::Session { message, .. } => assert_eq!(message, "Invalid credentials"),
        other => panic!("Expected Session variant, got {:?}", other),
    }
}

/// **VALUE**: Verifies errors without a backend message keep their description.
///
/// **BUG THIS CATCHES**: Would catch an empty message for transport failures.
#[test]
fn given_session_error_without_message_when_converted_then_display_used() {
    // GIVEN: A 500 without a JSON body
    let error = SessionError::from_response(500, "oops");

    // WHEN: Converting
    let cli: CliError = error.into();

    // THEN: Should fall back to the error's Display
    let text = cli.to_string();
    assert!(text.contains("HTTP 500"), "Unexpected message: {text}");
}

/// **VALUE**: Verifies invalid input maps to the Input variant.
///
/// **BUG THIS CATCHES**: Would catch blank emails being reported as backend
/// failures.
#[test]
fn given_blank_email_when_converted_then_input_error() {
    // GIVEN: Rejected credentials
    let error = LoginCredentials::new("  ", "secret").unwrap_err();

    // WHEN: Converting
    let cli: CliError = error.into();

    // THEN: Should be an input error
    assert!(matches!(cli, CliError::Input { .. }));
}
