use crate::Identity;

use serde_json::json;

/// **VALUE**: Verifies that a JSON object becomes an identity with its fields intact.
///
/// **WHY THIS MATTERS**: The UI reads arbitrary profile fields (name, avatar) from the
/// identity; dropping or reshaping them would break rendering.
///
/// **BUG THIS CATCHES**: Would catch if the identity starts projecting onto a fixed struct.
#[test]
fn given_user_object_when_converted_then_keeps_all_fields() {
    // GIVEN: A backend user record
    let value = json!({"id": 1, "name": "Ana", "roles": ["author"]});

    // WHEN: Converting
    let identity = Identity::from_value(value).expect("object is an identity");

    // THEN: Every field is reachable
    assert_eq!(identity.id(), Some(&json!(1)));
    assert_eq!(identity.field("name"), Some(&json!("Ana")));
    assert_eq!(identity.fields().len(), 3);
}

/// **VALUE**: Verifies that non-object values are not identities.
///
/// **WHY THIS MATTERS**: `GET /me` answering `{"user": null}` means "no session"; treating
/// null as an identity would mark an anonymous visitor as authenticated.
///
/// **BUG THIS CATCHES**: Would catch a permissive conversion accepting null or scalars.
#[test]
fn given_null_or_scalar_when_converted_then_returns_none() {
    // GIVEN / WHEN / THEN
    assert!(Identity::from_value(json!(null)).is_none());
    assert!(Identity::from_value(json!("user")).is_none());
    assert!(Identity::from_value(json!([1, 2])).is_none());
}

/// **VALUE**: Verifies transparent serde so identities round-trip as plain objects.
///
/// **WHY THIS MATTERS**: Identities are deserialized straight out of response bodies.
///
/// **BUG THIS CATCHES**: Would catch a wrapper field appearing in the serialized form.
#[test]
fn given_identity_when_serialized_then_is_plain_object() {
    // GIVEN: An identity
    let identity: Identity = serde_json::from_value(json!({"id": 7})).unwrap();

    // WHEN: Serializing
    let value = serde_json::to_value(&identity).unwrap();

    // THEN: Same shape as the input
    assert_eq!(value, json!({"id": 7}));
}
