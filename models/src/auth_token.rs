//! Bearer credential issued by the login endpoint.

use crate::ModelError;

use common::RedactedSecret;

/// Token type assumed when the backend omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Token plus its scheme, rendered as `Authorization: <token_type> <token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    token: RedactedSecret,
    token_type: String,
}

impl AuthToken {
    /// A blank `token_type` falls back to [`DEFAULT_TOKEN_TYPE`].
    ///
    /// # Errors
    /// Returns [`ModelError::Validation`] if the token is blank or either part
    /// contains whitespace, which would corrupt the header.
    #[track_caller]
    pub fn new(token: impl Into<String>, token_type: Option<&str>) -> Result<Self, ModelError> {
        let token = RedactedSecret::new(token);
        let token_type = match token_type.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => DEFAULT_TOKEN_TYPE.to_string(),
        };

        if token.expose().trim().is_empty() {
            return Err(ModelError::validation("Token must not be empty"));
        }
        if token.expose().chars().any(char::is_whitespace) {
            return Err(ModelError::validation("Token must not contain whitespace"));
        }
        if token_type.chars().any(char::is_whitespace) {
            return Err(ModelError::validation(format!(
                "Token type '{token_type}' must not contain whitespace"
            )));
        }

        Ok(Self { token, token_type })
    }

    pub fn token(&self) -> &RedactedSecret {
        &self.token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Value for the `Authorization` header. Contains the secret.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.token.expose())
    }
}
