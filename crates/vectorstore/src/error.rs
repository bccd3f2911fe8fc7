//! Error types for vector store operations
//!
//! Native backend errors never leave an adapter: they are translated into
//! one of these variants, each of which reports an [`ErrorKind`].

use dataclients_core::{
    CollectionConfig, CollectionInfo, ErrorKind, Retryable, TransientKind, ValidationError,
};
use dataclients_embed::EmbeddingError;
use thiserror::Error;

/// Result type for vector store operations
pub type VectorResult<T> = std::result::Result<T, VectorError>;

/// Errors from vector store operations
#[derive(Debug, Error)]
pub enum VectorError {
    /// Caller-supplied data violates the contract
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store configuration is unusable
    #[error("store config error: {0}")]
    Config(String),

    /// Rate limit, timeout or network fault
    #[error("{backend} {kind}: {message} (after {attempts} attempt(s))")]
    Transient {
        /// Backend name
        backend: &'static str,
        /// Cause
        kind: TransientKind,
        /// Native message
        message: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Backend misbehaved, or could not be reached when opening a session
    #[error("{backend} fault: {message}")]
    BackendFault {
        /// Backend name
        backend: &'static str,
        /// What happened
        message: String,
    },

    /// Existing collection was created with another dimension or metric
    #[error("collection '{collection}' conflicts with requested config: expected {expected}, found {found}")]
    ConfigConflict {
        /// Collection name
        collection: String,
        /// Requested configuration
        expected: String,
        /// Configuration the collection has
        found: String,
    },

    /// Embedding a text query failed
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Some sub-batches were written before one failed
    #[error(
        "partial upsert: {} record(s) written, {} not written: {source}",
        succeeded.len(),
        pending.len()
    )]
    PartialUpsert {
        /// Ids durably written
        succeeded: Vec<String>,
        /// Ids not written
        pending: Vec<String>,
        /// Failure that stopped the write
        source: Box<VectorError>,
    },
}

impl VectorError {
    /// Taxonomy kind
    ///
    /// A partial upsert reports the kind of the failure that stopped it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VectorError::Validation(_) | VectorError::Config(_) => ErrorKind::Validation,
            VectorError::Transient { .. } => ErrorKind::Transient,
            VectorError::BackendFault { .. } => ErrorKind::BackendFault,
            VectorError::ConfigConflict { .. } => ErrorKind::ConfigConflict,
            VectorError::Embedding(e) => e.kind(),
            VectorError::PartialUpsert { source, .. } => source.kind(),
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub(crate) fn fault(backend: &'static str, message: impl Into<String>) -> Self {
        VectorError::BackendFault {
            backend,
            message: message.into(),
        }
    }

    pub(crate) fn conflict(
        collection: &str,
        requested: &CollectionConfig,
        existing: &CollectionInfo,
    ) -> Self {
        Self::conflict_found(
            collection,
            requested,
            format!("dimension {}, metric {}", existing.dimension, existing.metric),
        )
    }

    /// Conflict with a collection whose configuration cannot be read back
    pub(crate) fn conflict_found(
        collection: &str,
        requested: &CollectionConfig,
        found: String,
    ) -> Self {
        let dimension = requested
            .dimension
            .map_or_else(|| "any".to_string(), |d| d.to_string());
        VectorError::ConfigConflict {
            collection: collection.to_string(),
            expected: format!("dimension {}, metric {}", dimension, requested.metric),
            found,
        }
    }
}

impl Retryable for VectorError {
    fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            VectorError::Transient { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn with_attempts(self, attempts: u32) -> Self {
        match self {
            VectorError::Transient {
                backend,
                kind,
                message,
                ..
            } => VectorError::Transient {
                backend,
                kind,
                message,
                attempts,
            },
            other => other,
        }
    }
}
