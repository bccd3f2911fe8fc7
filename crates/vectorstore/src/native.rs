//! Native client errors and their translation
//!
//! Native client seams ([`crate::chroma::ChromaApi`],
//! [`crate::qdrant::QdrantApi`]) report failures as [`NativeError`]. The
//! adapter translates them into [`VectorError`] before returning:
//!
//! | Native | Session | Result |
//! |--------|---------|--------|
//! | timeout, HTTP 408 | any | Transient(Timeout) |
//! | rate limited, HTTP 429 | any | Transient(RateLimited) |
//! | HTTP 502/503/504 | any | Transient(Network) |
//! | connect failure | established | Transient(Network) |
//! | connect failure | opening | BackendFault |
//! | other status, decode error, closed client | any | BackendFault |

use crate::error::VectorError;
use dataclients_core::TransientKind;
use thiserror::Error;

/// Result type for native client calls
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Failure reported by a native client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// Call exceeded its timeout
    #[error("timed out: {0}")]
    Timeout(String),

    /// Connection refused, reset or dropped
    #[error("connection failed: {0}")]
    Connect(String),

    /// Backend asked the client to slow down
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response body could not be decoded
    #[error("undecodable response: {0}")]
    Decode(String),

    /// Client was closed
    #[error("client is closed")]
    Closed,
}

impl NativeError {
    /// Status error with a body
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        NativeError::Status {
            status,
            message: message.into(),
        }
    }

    /// Whether this status means "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, NativeError::Status { status: 404, .. })
    }

    /// Whether this status means "already exists"
    pub fn is_conflict(&self) -> bool {
        matches!(self, NativeError::Status { status: 409, .. })
    }

    /// Translate for a call made on an established session
    pub fn into_vector_error(self, backend: &'static str) -> VectorError {
        self.translate(backend, true)
    }

    /// Translate for a call made while opening a session
    pub fn into_session_error(self, backend: &'static str) -> VectorError {
        self.translate(backend, false)
    }

    fn translate(self, backend: &'static str, established: bool) -> VectorError {
        let transient = |kind: TransientKind, message: String| VectorError::Transient {
            backend,
            kind,
            message,
            attempts: 1,
        };
        match self {
            NativeError::Timeout(message) => transient(TransientKind::Timeout, message),
            NativeError::RateLimited(message) => transient(TransientKind::RateLimited, message),
            NativeError::Status { status, message } => match status {
                408 => transient(TransientKind::Timeout, message),
                429 => transient(TransientKind::RateLimited, message),
                502..=504 => transient(TransientKind::Network, format!("HTTP {}: {}", status, message)),
                _ => VectorError::fault(backend, format!("HTTP {}: {}", status, message)),
            },
            NativeError::Connect(message) if established => {
                transient(TransientKind::Network, message)
            }
            NativeError::Connect(message) => {
                VectorError::fault(backend, format!("cannot reach server: {}", message))
            }
            NativeError::Decode(message) => {
                VectorError::fault(backend, format!("malformed response: {}", message))
            }
            NativeError::Closed => VectorError::fault(backend, "client is closed"),
        }
    }
}

impl From<reqwest::Error> for NativeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NativeError::Timeout(e.to_string())
        } else if e.is_decode() {
            NativeError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            NativeError::status(status.as_u16(), e.to_string())
        } else {
            NativeError::Connect(e.to_string())
        }
    }
}

impl From<serde_json::Error> for NativeError {
    fn from(e: serde_json::Error) -> Self {
        NativeError::Decode(e.to_string())
    }
}
