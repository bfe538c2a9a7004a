use std::path::PathBuf;

use common::ErrorLocation;
use thiserror::Error as ThisError;

/// Failures of the durable credential store.
#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Storage Read Error: {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Storage Parse Error: {path}: {reason} {location}")]
    Parse {
        path: PathBuf,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Storage Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Storage Unavailable: {message} {location}")]
    Unavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Storage Path Detection Error: {message} {location}")]
    PathDetection {
        message: String,
        location: ErrorLocation,
    },
}

impl StorageError {
    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn path_detection(message: impl Into<String>) -> Self {
        StorageError::PathDetection {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }
}
