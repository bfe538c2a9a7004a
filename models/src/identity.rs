//! The authenticated user's profile, as returned by the backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque user record.
///
/// The session core only cares whether an identity is present; fields are
/// kept verbatim so the UI can read whatever the backend sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Map<String, Value>);

impl Identity {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build an identity from an arbitrary JSON value.
    ///
    /// Returns `None` for anything that is not an object (`null`, strings, ...),
    /// which the backend uses to signal "no user".
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn id(&self) -> Option<&Value> {
        self.field("id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}
