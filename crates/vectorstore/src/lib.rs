//! Vector store clients behind one contract
//!
//! - [`ChromaStore`]: embedded-local backend (blocking), a Chroma server
//!   process on this machine
//! - [`QdrantStore`] / [`AsyncQdrantStore`]: server backend, blocking and
//!   non-blocking
//!
//! All of them honour [`VectorStore`] / [`AsyncVectorStore`] identically:
//! same validation, same score normalization, same ordering, same error
//! kinds. [`open_store`] and [`open_async_store`] build one from a
//! [`StoreConfig`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod chroma;
pub mod config;
pub mod error;
pub mod factory;
pub mod native;
pub mod qdrant;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chroma::{ChromaStore, RetentionPolicy, RetentionTier};
pub use config::{Backend, ChromaConfig, QdrantConfig, StoreConfig};
pub use error::{VectorError, VectorResult};
pub use factory::{open_async_store, open_store};
pub use native::NativeError;
pub use qdrant::{AsyncQdrantStore, QdrantStore};
pub use store::{AsyncVectorStore, VectorStore};
