//! Unified error type for the dataclients facade.
//!
//! Wraps the errors of the member crates and reports one [`ErrorKind`] for
//! all of them, so callers can branch on the taxonomy without knowing which
//! client failed.

use dataclients_core::{ErrorKind, ValidationError};
use dataclients_embed::EmbeddingError;
use dataclients_vectorstore::VectorError;
use thiserror::Error;

/// All dataclients errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied data violates a contract
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Embedding failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Vector store operation failed
    #[error(transparent)]
    Store(#[from] VectorError),

    /// Configuration is missing or unusable
    #[error("config error: {0}")]
    Config(String),

    /// I/O error reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for dataclients operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Taxonomy kind.
    ///
    /// Configuration, I/O and serialization problems are the caller's to
    /// fix and report as validation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(e) => e.kind(),
            Error::Embedding(e) => e.kind(),
            Error::Store(e) => e.kind(),
            Error::Config(_) | Error::Io(_) | Error::Serialization(_) => ErrorKind::Validation,
        }
    }

    /// Check if retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Check if this is a collection configuration conflict.
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::ConfigConflict
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
