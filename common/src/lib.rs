//! Shared building blocks for the session workspace.
//!
//! Nothing in here knows about sessions or HTTP clients; these are the
//! small types every other crate leans on for error reporting and secret
//! handling.
//!
//! ## Architecture
//!
//! - **common** (this crate): error locations, status codes, secrets
//! - **models**: pure data exchanged with the backend
//! - **session-core**: transport, CSRF guard, session lifecycle
//! - **sessionctl**: command-line wiring

pub mod error;
pub mod http_status;
pub mod redacted_secret;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use http_status::HttpStatusCode;
pub use redacted_secret::RedactedSecret;

#[cfg(test)]
mod tests;
