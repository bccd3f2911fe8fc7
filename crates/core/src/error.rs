//! Error taxonomy shared by every client.
//!
//! Concrete error types live next to the code that raises them
//! (`EmbeddingError`, `VectorError`). Each of them reports one of the
//! [`ErrorKind`]s below, which is what callers branch on.
//!
//! | Kind | Retried | Meaning |
//! |------|---------|---------|
//! | Validation | never | caller-supplied data violates the contract |
//! | Transient | by the retry shim | rate limit, timeout, network fault |
//! | BackendFault | never | malformed response, internal backend error, refused connection |
//! | ConfigConflict | never | collection reopened with incompatible dimension or metric |

use thiserror::Error;

/// Taxonomy kind of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller-supplied data violates a contract
    Validation,
    /// Failure expected to resolve on retry
    Transient,
    /// Backend misbehaved or could not be reached at session establishment
    BackendFault,
    /// Collection configuration conflicts with the requested one
    ConfigConflict,
}

impl ErrorKind {
    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Transient => "Transient",
            ErrorKind::BackendFault => "BackendFault",
            ErrorKind::ConfigConflict => "ConfigConflict",
        }
    }

    /// Only transient failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cause of a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientKind {
    /// Backend answered 429 or equivalent
    RateLimited,
    /// The call exceeded its timeout
    Timeout,
    /// Connection reset, refused mid-session, or gateway error
    Network,
}

impl TransientKind {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            TransientKind::RateLimited => "rate limited",
            TransientKind::Timeout => "timeout",
            TransientKind::Network => "network",
        }
    }
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied data violates a contract.
///
/// These are caller bugs, not faults: they are raised before any backend
/// call is made and are never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Vector length differs from the collection (or batch) dimensionality
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimensionality the collection or batch requires
        expected: usize,
        /// Dimensionality supplied
        got: usize,
    },

    /// `n_results` must be positive
    #[error("invalid n_results: {0} (must be > 0)")]
    InvalidNResults(usize),

    /// Filter operator the target cannot express
    #[error("unsupported filter on '{field}': {operator} is not supported by {target}")]
    UnsupportedFilter {
        /// Payload key the condition applies to
        field: String,
        /// Operator name, e.g. `$prefix`
        operator: String,
        /// Backend or syntax that rejected it
        target: String,
    },

    /// Filter is malformed
    #[error("invalid filter on '{field}': {reason}")]
    InvalidFilter {
        /// Payload key the condition applies to
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Empty or whitespace-only input where content is required
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Record id is unusable
    #[error("invalid record id '{id}': {reason}")]
    InvalidId {
        /// The offending id
        id: String,
        /// Why it is invalid
        reason: String,
    },

    /// The same id appears twice in one write
    #[error("duplicate record id '{0}' in one upsert")]
    DuplicateId(String),

    /// Payload uses a key reserved by the adapters
    #[error("payload key '{0}' is reserved")]
    ReservedPayloadKey(String),

    /// Vector is empty or holds non-finite values
    #[error("invalid vector for '{id}': {reason}")]
    InvalidVector {
        /// Record id (or `query`)
        id: String,
        /// Why it is invalid
        reason: String,
    },

    /// Collection name is unusable
    #[error("invalid collection name '{name}': {reason}")]
    InvalidCollectionName {
        /// The offending name
        name: String,
        /// Why it is invalid
        reason: String,
    },

    /// Text query without an embedder to route it through
    #[error("text query requires a configured embedder")]
    MissingEmbedder,

    /// Configured dimensionality is zero
    #[error("invalid dimension: {0} (must be > 0)")]
    InvalidDimension(usize),
}

impl ValidationError {
    /// Every validation error has the same kind.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
