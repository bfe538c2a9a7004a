use crate::commands::describe;

use models::Identity;

use serde_json::json;

/// **VALUE**: Verifies how users are named in command output.
///
/// **WHY THIS MATTERS**: Backends return arbitrary user objects; output must
/// stay readable whichever fields exist.
///
/// **BUG THIS CATCHES**: Would catch quoted string ids or a panic on identities
/// without email or id.
#[test]
fn given_identities_with_various_fields_when_described_then_best_label_used() {
    // GIVEN: Identities with email, string id, numeric id and nothing
    let with_email = Identity::from_value(json!({ "id": 1, "email": "a@b.com" })).unwrap();
    let with_string_id = Identity::from_value(json!({ "id": "u-1" })).unwrap();
    let with_number_id = Identity::from_value(json!({ "id": 42 })).unwrap();
    let bare = Identity::from_value(json!({ "name": "x" })).unwrap();

    // WHEN / THEN: Email wins, then the unquoted id, then a placeholder
    assert_eq!(describe(&with_email), "a@b.com");
    assert_eq!(describe(&with_string_id), "u-1");
    assert_eq!(describe(&with_number_id), "42");
    assert_eq!(describe(&bare), "unknown user");
}
