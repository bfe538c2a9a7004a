use crate::{LoginCredentials, ModelError};

/// **VALUE**: Verifies that blank emails are rejected before any request is made.
///
/// **WHY THIS MATTERS**: Submitting an empty form costs a CSRF priming round-trip plus a
/// login call that can only fail.
///
/// **BUG THIS CATCHES**: Would catch if trimming or the emptiness check is removed.
#[test]
fn given_blank_email_when_creating_credentials_then_returns_validation_error() {
    // GIVEN / WHEN: Whitespace-only email
    let result = LoginCredentials::new("   ", "secret");

    // THEN: Validation error naming the field
    match result {
        Err(ModelError::Validation { message, .. }) => assert!(message.contains("Email")),
        Ok(_) => panic!("blank email must be rejected"),
    }
}

/// **VALUE**: Verifies that credentials never print the password.
///
/// **WHY THIS MATTERS**: Login attempts are logged at debug level.
///
/// **BUG THIS CATCHES**: Would catch the password field losing its redacted wrapper.
#[test]
fn given_credentials_when_debug_formatted_then_password_hidden() {
    // GIVEN: Valid credentials
    let credentials = LoginCredentials::new(" a@b.com ", "x-very-secret").unwrap();

    // WHEN: Debug formatting
    let debug = format!("{:?}", credentials);

    // THEN: Email trimmed and visible, password hidden
    assert_eq!(credentials.email(), "a@b.com");
    assert!(debug.contains("a@b.com"));
    assert!(!debug.contains("x-very-secret"));
}
