//! Centralized error types for maildigest.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the maildigest library.
#[derive(Error, Debug)]
pub enum DigestError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Mail credentials are missing from the environment.
    #[error("Mail credentials not found: set {0}")]
    Credentials(String),

    /// The mail server could not be reached or the TLS handshake failed.
    #[error("Connection to '{host}' failed: {reason}")]
    Connection { host: String, reason: String },

    /// The mail server rejected the login.
    #[error("Authentication failed for '{user}': {reason}")]
    Authentication { user: String, reason: String },

    /// A mailbox-level command (e.g. SELECT) was rejected.
    #[error("Mailbox error: {0}")]
    Mailbox(String),

    /// The summarization endpoint failed or returned an unusable answer.
    #[error("Summarization failed: {0}")]
    Summary(String),

    /// The digest could not be delivered.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Convenience alias for `Result<T, DigestError>`.
pub type Result<T> = std::result::Result<T, DigestError>;

impl DigestError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Credentials(_)
                | Self::Connection { .. }
                | Self::Authentication { .. }
                | Self::Mailbox(_)
        )
    }
}
