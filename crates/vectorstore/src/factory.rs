//! Store construction from configuration
//!
//! The backend is a closed set chosen by [`Backend`]; the factories hand out
//! trait objects so callers never name a concrete adapter.

use crate::chroma::ChromaStore;
use crate::config::{Backend, StoreConfig};
use crate::error::{VectorError, VectorResult};
use crate::qdrant::{AsyncQdrantStore, QdrantStore};
use crate::store::{AsyncVectorStore, VectorStore};
use dataclients_embed::{AsyncEmbedder, Embedder};
use std::sync::Arc;
use tracing::debug;

/// Open a blocking store
///
/// Sessions are opened lazily, so this does not touch the network.
/// `server-async` configs must go through [`open_async_store`].
pub fn open_store(
    config: StoreConfig,
    embedder: Option<Arc<dyn Embedder>>,
) -> VectorResult<Box<dyn VectorStore>> {
    debug!(backend = %config.backend, "opening vector store");
    match config.backend {
        Backend::EmbeddedLocal => Ok(Box::new(ChromaStore::new(config, embedder)?)),
        Backend::ServerSync => Ok(Box::new(QdrantStore::new(config, embedder)?)),
        Backend::ServerAsync => Err(VectorError::Config(
            "backend server-async is non-blocking; use open_async_store".to_string(),
        )),
    }
}

/// Open a non-blocking store, verifying the server is reachable
pub async fn open_async_store(
    config: StoreConfig,
    embedder: Option<Arc<dyn AsyncEmbedder>>,
) -> VectorResult<Box<dyn AsyncVectorStore>> {
    debug!(backend = %config.backend, "opening async vector store");
    match config.backend {
        Backend::ServerAsync => Ok(Box::new(AsyncQdrantStore::create(config, embedder).await?)),
        other => Err(VectorError::Config(format!(
            "backend {} is blocking; use open_store",
            other
        ))),
    }
}
