//! Text embedding clients.
//!
//! Turns text into fixed-length vectors for the vector stores. One
//! [`HttpEmbedder`] covers every supported provider and implements both the
//! blocking [`Embedder`] and the non-blocking [`AsyncEmbedder`] trait:
//!
//! - **OpenAI**: hosted, batches of up to 100 texts
//! - **Voyage**: hosted, batches of up to 128, query/document input types
//! - **Ollama**: local inference, one text per call
//!
//! Transient failures (rate limits, timeouts, network faults) go through the
//! shared retry shim from `dataclients-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod embedder;
pub mod error;
pub mod http;
pub mod provider;

pub use config::EmbedderConfig;
pub use embedder::{AsyncEmbedder, Embedder};
pub use error::{EmbeddingError, EmbeddingResult};
pub use http::HttpEmbedder;
pub use provider::{InputType, Provider};
