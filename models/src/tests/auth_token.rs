use crate::{AuthToken, DEFAULT_TOKEN_TYPE, ModelError};

/// **VALUE**: Verifies the `Authorization` header value format.
///
/// **WHY THIS MATTERS**: The backend expects exactly `<token_type> <token>`.
///
/// **BUG THIS CATCHES**: Would catch swapped order or a missing separator.
#[test]
fn given_token_pair_when_rendering_header_then_uses_type_space_token() {
    // GIVEN: A token issued with an explicit type
    let token = AuthToken::new("abc", Some("Bearer")).unwrap();

    // WHEN / THEN
    assert_eq!(token.authorization_value(), "Bearer abc");
}

/// **VALUE**: Verifies that a missing or blank token type defaults to Bearer.
///
/// **WHY THIS MATTERS**: Some backends omit `token_type`; the header must still be valid.
///
/// **BUG THIS CATCHES**: Would catch an empty scheme producing `" abc"`.
#[test]
fn given_missing_token_type_when_creating_then_defaults_to_bearer() {
    // GIVEN / WHEN
    let missing = AuthToken::new("abc", None).unwrap();
    let blank = AuthToken::new("abc", Some("  ")).unwrap();

    // THEN
    assert_eq!(missing.token_type(), DEFAULT_TOKEN_TYPE);
    assert_eq!(blank.authorization_value(), "Bearer abc");
}

/// **VALUE**: Verifies that empty or whitespace-bearing tokens are rejected.
///
/// **WHY THIS MATTERS**: Such a token would either send `Bearer ` or smuggle extra
/// header content.
///
/// **BUG THIS CATCHES**: Would catch if validation is bypassed.
#[test]
fn given_invalid_token_when_creating_then_returns_validation_error() {
    // GIVEN / WHEN / THEN
    assert!(matches!(
        AuthToken::new("", None),
        Err(ModelError::Validation { .. })
    ));
    assert!(matches!(
        AuthToken::new("ab c", None),
        Err(ModelError::Validation { .. })
    ));
}
