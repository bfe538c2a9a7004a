use common::ErrorLocation;

use models::ModelError;
use session_core::SessionError;
use session_core::error::{ConfigError, StorageError};

use std::panic::Location;

use thiserror::Error;

/// Errors reported by `sessionctl` commands.
///
/// Library errors are flattened to their message at the boundary; the
/// location records where the CLI received them.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from this binary (logger, directories)
    #[error("Sessionctl Error: {message} {location}")]
    Sessionctl {
        message: String,
        location: ErrorLocation,
    },

    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Backend or transport failure, with the message shown to the user
    #[error("Session Error: {message} {location}")]
    Session {
        message: String,
        location: ErrorLocation,
    },

    /// Rejected command-line input
    #[error("Input Error: {message} {location}")]
    Input {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not signed in {location}")]
    NotSignedIn { location: ErrorLocation },
}

impl CliError {
    #[track_caller]
    pub fn sessionctl(message: impl Into<String>) -> Self {
        CliError::Sessionctl {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn session(message: impl Into<String>) -> Self {
        CliError::Session {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_signed_in() -> Self {
        CliError::NotSignedIn {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SessionError> for CliError {
    #[track_caller]
    fn from(error: SessionError) -> Self {
        let message = error
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        CliError::session(message)
    }
}

impl From<ConfigError> for CliError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        CliError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<StorageError> for CliError {
    #[track_caller]
    fn from(error: StorageError) -> Self {
        CliError::sessionctl(error.to_string())
    }
}

impl From<ModelError> for CliError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        CliError::Input {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
