//! Domain models exchanged with the blog API.
//!
//! Pure data structures with construction-time validation only. Session
//! behavior lives in `session-core`.

pub mod auth_token;
pub mod credentials;
pub mod error;
pub mod identity;

pub use auth_token::{AuthToken, DEFAULT_TOKEN_TYPE};
pub use credentials::LoginCredentials;
pub use error::model_error::ModelError;
pub use identity::Identity;

#[cfg(test)]
mod tests;
