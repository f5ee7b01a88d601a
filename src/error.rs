//! Error taxonomy for the client library.
//!
//! Display strings are user-facing: the session store records
//! `err.to_string()` as its error message and returns the same value to the
//! caller, so both paths show identical text.

use std::path::PathBuf;

/// Errors produced by gateway, transport and file-browser calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend answered with a failure envelope or a non-2xx status.
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    /// The request never produced a response (unreachable host, timeout).
    #[error("{0}")]
    Transport(String),

    /// A policed endpoint answered 401; the session has been invalidated.
    #[error("session expired")]
    Unauthorized,

    /// A success response could not be decoded into the expected payload.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Durable session storage failed.
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),

    /// A newer auth action was issued while this one was in flight.
    #[error("superseded by a newer auth request")]
    Superseded,

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status attached to the failure, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }
}

/// Errors produced by [`crate::storage::KeyValueStore`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("storage file {} is corrupt", path.display())]
    Corrupt { path: PathBuf },
}
