//! Login form payload.

use crate::ModelError;

use common::RedactedSecret;

/// Email/password pair submitted to the login endpoint.
///
/// The password is held in a [`RedactedSecret`] so the struct is safe to log.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    email: String,
    password: RedactedSecret,
}

impl LoginCredentials {
    /// # Errors
    /// Returns [`ModelError::Validation`] if either field is blank.
    #[track_caller]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, ModelError> {
        let email = email.into().trim().to_string();
        let password = RedactedSecret::new(password);

        if email.is_empty() {
            return Err(ModelError::validation("Email must not be empty"));
        }
        if password.is_empty() {
            return Err(ModelError::validation("Password must not be empty"));
        }

        Ok(Self { email, password })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &RedactedSecret {
        &self.password
    }
}
