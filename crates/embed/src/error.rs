//! Embedding errors

use dataclients_core::{ErrorKind, Retryable, TransientKind};
use thiserror::Error;

/// Result type for embedding operations
pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// Failure to produce an embedding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    /// Empty or whitespace-only text
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Rate limit, timeout or network fault
    #[error("{provider} {kind}: {message} (after {attempts} attempt(s))")]
    Transient {
        /// Provider name
        provider: &'static str,
        /// Cause
        kind: TransientKind,
        /// Transport or server message
        message: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Provider rejected the request
    #[error("{provider} returned HTTP {status}: {message}")]
    Request {
        /// Provider name
        provider: &'static str,
        /// HTTP status
        status: u16,
        /// Response body
        message: String,
    },

    /// Response could not be decoded or has the wrong shape
    #[error("malformed response from {provider}: {message}")]
    MalformedResponse {
        /// Provider name
        provider: &'static str,
        /// What was wrong
        message: String,
    },

    /// Embedder configuration is unusable
    #[error("embedder config error: {0}")]
    Config(String),
}

impl EmbeddingError {
    /// Taxonomy kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmbeddingError::EmptyInput(_) | EmbeddingError::Config(_) => ErrorKind::Validation,
            EmbeddingError::Transient { .. } => ErrorKind::Transient,
            EmbeddingError::Request { .. } | EmbeddingError::MalformedResponse { .. } => {
                ErrorKind::BackendFault
            }
        }
    }

    pub(crate) fn malformed(provider: &'static str, message: impl Into<String>) -> Self {
        EmbeddingError::MalformedResponse {
            provider,
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status
    pub(crate) fn from_status(provider: &'static str, status: u16, body: String) -> Self {
        let transient = match status {
            429 => Some(TransientKind::RateLimited),
            408 => Some(TransientKind::Timeout),
            500 | 502 | 503 | 504 => Some(TransientKind::Network),
            _ => None,
        };
        match transient {
            Some(kind) => EmbeddingError::Transient {
                provider,
                kind,
                message: format!("HTTP {}: {}", status, body),
                attempts: 1,
            },
            None => EmbeddingError::Request {
                provider,
                status,
                message: body,
            },
        }
    }

    /// Map a transport error
    pub(crate) fn from_reqwest(provider: &'static str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EmbeddingError::Transient {
                provider,
                kind: TransientKind::Timeout,
                message: e.to_string(),
                attempts: 1,
            }
        } else if e.is_connect() || e.is_request() {
            EmbeddingError::Transient {
                provider,
                kind: TransientKind::Network,
                message: e.to_string(),
                attempts: 1,
            }
        } else if e.is_decode() {
            EmbeddingError::malformed(provider, e.to_string())
        } else if let Some(status) = e.status() {
            EmbeddingError::from_status(provider, status.as_u16(), e.to_string())
        } else {
            EmbeddingError::Transient {
                provider,
                kind: TransientKind::Network,
                message: e.to_string(),
                attempts: 1,
            }
        }
    }
}

impl Retryable for EmbeddingError {
    fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            EmbeddingError::Transient { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn with_attempts(self, attempts: u32) -> Self {
        match self {
            EmbeddingError::Transient {
                provider,
                kind,
                message,
                ..
            } => EmbeddingError::Transient {
                provider,
                kind,
                message,
                attempts,
            },
            other => other,
        }
    }
}
