use crate::error::StorageError;
use crate::storage::{
    AUTH_TOKEN_KEY, CredentialStorage, FileCredentialStorage, clear_token, load_token,
    persist_token,
};

use models::AuthToken;

/// **VALUE**: Verifies that a token written by one storage instance is read by a new one.
///
/// **WHY THIS MATTERS**: This is the "survives a restart" contract of the bearer strategy.
///
/// **BUG THIS CATCHES**: Would catch writes that only live in memory, or a temp file never
/// renamed into place.
#[test]
fn given_token_persisted_when_reopened_then_token_loaded() {
    // GIVEN: A token persisted to a file
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("credentials.json");
    let first = FileCredentialStorage::new(&path);
    persist_token(&first, &AuthToken::new("abc", Some("Bearer")).unwrap()).unwrap();

    // WHEN: Opening the same file again
    let second = FileCredentialStorage::new(&path);
    let loaded = load_token(&second).unwrap();

    // THEN: Token survives and no temp file is left behind
    assert_eq!(loaded.unwrap().authorization_value(), "Bearer abc");
    assert!(!path.with_extension("json.tmp").exists());
}

/// **VALUE**: Verifies that the credential file is private to the user on Unix.
///
/// **WHY THIS MATTERS**: The file holds a live bearer token.
///
/// **BUG THIS CATCHES**: Would catch the permission step being dropped.
#[cfg(unix)]
#[test]
fn given_token_persisted_when_inspecting_file_then_mode_is_0600() {
    use std::os::unix::fs::PermissionsExt;

    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let storage = FileCredentialStorage::new(&path);

    // WHEN
    persist_token(&storage, &AuthToken::new("abc", None).unwrap()).unwrap();

    // THEN
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

/// **VALUE**: Verifies that a corrupted file surfaces a parse error instead of an empty store.
///
/// **WHY THIS MATTERS**: Silently treating garbage as "no token" would then overwrite the
/// file on the next login and hide the corruption.
///
/// **BUG THIS CATCHES**: Would catch `unwrap_or_default` on the parse result.
#[test]
fn given_corrupted_file_when_reading_then_returns_parse_error() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{not json").unwrap();
    let storage = FileCredentialStorage::new(&path);

    // WHEN
    let result = storage.get(AUTH_TOKEN_KEY);

    // THEN
    assert!(matches!(result, Err(StorageError::Parse { .. })));
}

/// **VALUE**: Verifies that clearing a storage whose file never existed succeeds.
///
/// **WHY THIS MATTERS**: First-time visitors run through the "clear stale credential" path
/// during bootstrap.
///
/// **BUG THIS CATCHES**: Would catch a read error on a missing file.
#[test]
fn given_missing_file_when_clearing_then_ok_and_no_file_created() {
    // GIVEN
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    let storage = FileCredentialStorage::new(&path);

    // WHEN
    let result = clear_token(&storage);

    // THEN
    assert!(result.is_ok());
    assert!(!path.exists());
}
