//! # dataclients
//!
//! Typed clients for text embeddings and vector databases.
//!
//! One facade pairs an embedder with a vector store so applications can
//! write documents and search them by text:
//!
//! ```ignore
//! use dataclients::prelude::*;
//!
//! let clients = DataClients::load("clients.toml")?;
//! clients.upsert_documents("notes", &[Document::new("a", "hello world")])?;
//! for hit in clients.search_text("notes", "greeting", 5, None)? {
//!     println!("{} {:.3}", hit.id, hit.score);
//! }
//! clients.close()?;
//! ```
//!
//! ## Backends
//!
//! - `embedded-local`: Chroma server on this machine (blocking)
//! - `server-sync`: Qdrant, blocking
//! - `server-async`: Qdrant, non-blocking, through [`AsyncDataClients`]
//!
//! Every backend shares one contract: scores are "higher = more similar",
//! results are ordered by score then id, and failures report one of four
//! [`ErrorKind`]s.
//!
//! ## Embedders
//!
//! OpenAI, Voyage and Ollama, all through [`HttpEmbedder`].

#![warn(missing_docs)]

mod clients;
mod config;
mod error;

pub mod prelude;

pub use clients::{AsyncDataClients, DataClients, DataClientsBuilder, Document};
pub use config::ClientsConfig;
pub use error::{Error, Result};

pub use dataclients_core::{
    CollectionConfig, Condition, DistanceMetric, ErrorKind, Filter, Payload, PayloadValue, Query,
    Range, RetryPolicy, SearchRequest, SearchResult, TransientKind, ValidationError, VectorRecord,
};
pub use dataclients_embed::{
    AsyncEmbedder, Embedder, EmbedderConfig, EmbeddingError, HttpEmbedder, Provider,
};
pub use dataclients_vectorstore::{
    open_async_store, open_store, AsyncVectorStore, Backend, RetentionPolicy, RetentionTier,
    StoreConfig, VectorError, VectorStore,
};
