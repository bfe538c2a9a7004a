use crate::storage::{
    AUTH_TOKEN_KEY, AUTH_TOKEN_TYPE_KEY, CredentialStorage, MemoryCredentialStorage, clear_token,
    load_token, persist_token,
};

use models::AuthToken;

/// **VALUE**: Verifies that a persisted token is read back with its type.
///
/// **WHY THIS MATTERS**: Bootstrap rebuilds the `Authorization` header from these two
/// entries; losing the type would send `Bearer` for a differently-typed token.
///
/// **BUG THIS CATCHES**: Would catch the two keys being swapped or one not written.
#[test]
fn given_persisted_token_when_loaded_then_matches_original() {
    // GIVEN: A storage with a persisted token
    let storage = MemoryCredentialStorage::new();
    let token = AuthToken::new("abc", Some("Token")).unwrap();
    persist_token(&storage, &token).unwrap();

    // WHEN: Loading
    let loaded = load_token(&storage).unwrap();

    // THEN: Same token and raw entries are as expected
    assert_eq!(loaded, Some(token));
    assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    assert_eq!(
        storage.get(AUTH_TOKEN_TYPE_KEY).unwrap().as_deref(),
        Some("Token")
    );
}

/// **VALUE**: Verifies that a token without a stored type defaults to Bearer.
///
/// **WHY THIS MATTERS**: Storage written by older clients may hold only `auth_token`.
///
/// **BUG THIS CATCHES**: Would catch a missing type being treated as "no token".
#[test]
fn given_token_without_type_when_loaded_then_defaults_to_bearer() {
    // GIVEN
    let storage = MemoryCredentialStorage::with_entries(&[(AUTH_TOKEN_KEY, "abc")]);

    // WHEN
    let loaded = load_token(&storage).unwrap().expect("token present");

    // THEN
    assert_eq!(loaded.authorization_value(), "Bearer abc");
}

/// **VALUE**: Verifies that a blank persisted token is treated as absent.
///
/// **WHY THIS MATTERS**: Sending `Authorization: Bearer ` just to receive a 401 wastes
/// the bootstrap and logs a misleading failure.
///
/// **BUG THIS CATCHES**: Would catch blank tokens reaching the transport.
#[test]
fn given_blank_token_when_loaded_then_none() {
    // GIVEN
    let storage =
        MemoryCredentialStorage::with_entries(&[(AUTH_TOKEN_KEY, "  "), (AUTH_TOKEN_TYPE_KEY, "Bearer")]);

    // WHEN / THEN
    assert!(load_token(&storage).unwrap().is_none());
}

/// **VALUE**: Verifies that clearing removes both entries.
///
/// **WHY THIS MATTERS**: A leftover `auth_token` would resurrect the session on the next
/// start after the user logged out.
///
/// **BUG THIS CATCHES**: Would catch only one key being removed.
#[test]
fn given_persisted_token_when_cleared_then_storage_empty() {
    // GIVEN
    let storage = MemoryCredentialStorage::new();
    persist_token(&storage, &AuthToken::new("abc", None).unwrap()).unwrap();

    // WHEN
    clear_token(&storage).unwrap();

    // THEN
    assert!(storage.is_empty());
    assert!(load_token(&storage).unwrap().is_none());
}
