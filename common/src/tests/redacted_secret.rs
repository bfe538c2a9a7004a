use crate::RedactedSecret;

/// **VALUE**: Verifies that Debug and Display never print the secret.
///
/// **WHY THIS MATTERS**: Passwords and bearer tokens flow through structs that get
/// logged with `{:?}`. One leaked token in a log file is a session hijack.
///
/// **BUG THIS CATCHES**: Would catch a derived Debug replacing the manual impl.
#[test]
fn given_secret_when_formatted_then_value_is_hidden() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("hunter2");

    // WHEN: Formatting both ways
    let debug = format!("{:?}", secret);
    let display = format!("{}", secret);

    // THEN: Neither contains the value
    assert!(!debug.contains("hunter2"));
    assert!(!display.contains("hunter2"));
    assert_eq!(secret.expose(), "hunter2");
    assert_eq!(secret.len(), 7);
}

/// **VALUE**: Verifies that serializing a secret fails instead of emitting it.
///
/// **WHY THIS MATTERS**: A `#[derive(Serialize)]` struct holding a secret would
/// otherwise write it into JSON without anyone noticing.
///
/// **BUG THIS CATCHES**: Would catch if the Serialize impl starts writing the value.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("abc");

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&secret);

    // THEN: Should fail
    assert!(result.is_err(), "Serialization must be refused");
}
