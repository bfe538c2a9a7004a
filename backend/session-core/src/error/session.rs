//! Error taxonomy for the session core.
//!
//! Key design decisions:
//! - Response failures are normalized here, at the transport boundary, from the
//!   status code plus an optional JSON `message`
//! - HTTP status codes stored directly (not parsed from strings)
//! - All errors include ErrorLocation for debugging
//! - `#[track_caller]` for automatic location capture

use crate::error::StorageError;

use common::{ErrorLocation, HttpStatusCode};

use reqwest::header::InvalidHeaderValue;
use serde_json::Value;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SessionError {
    /// No response was received.
    #[error("Network Error: {message} {location}")]
    Network {
        message: String,
        is_timeout: bool,
        is_connection: bool,
        location: ErrorLocation,
    },

    /// 401/419: missing or expired credential, or a stale CSRF token.
    #[error("Unauthorized: HTTP {status} - {detail} {location}", detail = detail(.message))]
    Unauthorized {
        status: HttpStatusCode,
        message: Option<String>,
        location: ErrorLocation,
    },

    /// 400/422: the backend rejected the payload.
    #[error("Validation Error: HTTP {status} - {detail} {location}", detail = detail(.message))]
    Validation {
        status: HttpStatusCode,
        message: Option<String>,
        location: ErrorLocation,
    },

    #[error("Server Error: HTTP {status} - {detail} {location}", detail = detail(.message))]
    Server {
        status: HttpStatusCode,
        message: Option<String>,
        location: ErrorLocation,
    },

    /// Any other non-success status.
    #[error("Rejected: HTTP {status} - {detail} {location}", detail = detail(.message))]
    Rejected {
        status: HttpStatusCode,
        message: Option<String>,
        location: ErrorLocation,
    },

    /// A success response whose body does not match the expected contract.
    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Error: {message} {location}")]
    Url {
        message: String,
        location: ErrorLocation,
    },

    #[error("HTTP Client Error: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },

    #[error("Header Error: {message} {location}")]
    Header {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn detail(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("no message")
}

impl SessionError {
    /// Normalize a non-success response into the taxonomy.
    ///
    /// `body` is the raw response text; a top-level JSON `message` string is
    /// kept when present.
    #[track_caller]
    pub fn from_response(status: u16, body: &str) -> Self {
        let status = HttpStatusCode(status);
        let message = extract_message(body);
        let location = ErrorLocation::caller();

        if status.is_unauthorized() {
            SessionError::Unauthorized {
                status,
                message,
                location,
            }
        } else if status.is_validation() {
            SessionError::Validation {
                status,
                message,
                location,
            }
        } else if status.is_server_error() {
            SessionError::Server {
                status,
                message,
                location,
            }
        } else {
            SessionError::Rejected {
                status,
                message,
                location,
            }
        }
    }

    #[track_caller]
    pub fn decode(message: impl Into<String>) -> Self {
        SessionError::Decode {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn header(message: impl Into<String>) -> Self {
        SessionError::Header {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        SessionError::Network {
            message: message.into(),
            is_timeout: true,
            is_connection: false,
            location: ErrorLocation::caller(),
        }
    }

    /// Message supplied by the backend, if the failure came with one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            SessionError::Unauthorized { message, .. }
            | SessionError::Validation { message, .. }
            | SessionError::Server { message, .. }
            | SessionError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            SessionError::Unauthorized { status, .. }
            | SessionError::Validation { status, .. }
            | SessionError::Server { status, .. }
            | SessionError::Rejected { status, .. } => Some(status.0),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Unauthorized { .. })
    }

    /// Stable label for logs.
    pub fn error_category(&self) -> &'static str {
        match self {
            SessionError::Network {
                is_timeout: true, ..
            } => "timeout",
            SessionError::Network {
                is_connection: true,
                ..
            } => "connection",
            SessionError::Network { .. } => "network",
            SessionError::Unauthorized { .. } => "unauthorized",
            SessionError::Validation { .. } => "validation",
            SessionError::Server { .. } => "server_error",
            SessionError::Rejected { .. } => "rejected",
            SessionError::Decode { .. } => "decode",
            SessionError::Url { .. } => "url",
            SessionError::Client { .. } => "client",
            SessionError::Header { .. } => "header",
            SessionError::Storage(_) => "storage",
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

impl From<reqwest::Error> for SessionError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        let location = ErrorLocation::caller();

        // Check for specific error kinds BEFORE converting to string
        if error.is_builder() {
            return SessionError::Client {
                message: error.to_string(),
                location,
            };
        }
        if error.is_decode() {
            return SessionError::Decode {
                message: error.to_string(),
                location,
            };
        }

        SessionError::Network {
            message: error.to_string(),
            is_timeout: error.is_timeout(),
            is_connection: error.is_connect(),
            location,
        }
    }
}

impl From<url::ParseError> for SessionError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        SessionError::Url {
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        SessionError::Decode {
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}

impl From<InvalidHeaderValue> for SessionError {
    #[track_caller]
    fn from(error: InvalidHeaderValue) -> Self {
        SessionError::Header {
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}
