//! Main entry point: a vector store paired with an embedder.
//!
//! [`DataClients`] is the blocking facade and [`AsyncDataClients`] the
//! non-blocking one. Both are built from a [`ClientsConfig`]; tests and
//! embedding applications can hand in their own store or embedder through
//! the builder instead.

use crate::config::ClientsConfig;
use crate::error::{Error, Result};
use dataclients_core::{
    Filter, Payload, SearchRequest, SearchResult, ValidationError, VectorRecord,
};
use dataclients_embed::{AsyncEmbedder, Embedder, EmbedderConfig, HttpEmbedder};
use dataclients_vectorstore::{
    open_async_store, open_store, AsyncVectorStore, StoreConfig, VectorStore,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A piece of text to embed and store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Record id
    pub id: String,
    /// Text to embed; stored alongside the vector
    pub text: String,
    /// Filterable metadata
    pub payload: Payload,
}

impl Document {
    /// Create a document with an empty payload.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            text: text.into(),
            payload: Payload::new(),
        }
    }

    /// Replace the payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    fn into_record(self, vector: Vec<f32>) -> VectorRecord {
        VectorRecord::new(self.id, vector)
            .with_payload(self.payload)
            .with_text(self.text)
    }
}

fn texts(documents: &[Document]) -> Vec<String> {
    documents.iter().map(|d| d.text.clone()).collect()
}

fn records(documents: &[Document], vectors: Vec<Vec<f32>>) -> Vec<VectorRecord> {
    documents
        .iter()
        .cloned()
        .zip(vectors)
        .map(|(doc, vector)| doc.into_record(vector))
        .collect()
}

fn vector_request(query: Vec<f32>, n_results: usize, filter: Option<Filter>) -> SearchRequest {
    let request = SearchRequest::vector(query, n_results);
    match filter {
        Some(filter) => request.with_filter(filter),
        None => request,
    }
}

fn http_embedder(config: Option<EmbedderConfig>) -> Result<Option<Arc<HttpEmbedder>>> {
    config
        .map(|c| HttpEmbedder::new(c).map(Arc::new).map_err(Error::from))
        .transpose()
}

/// Blocking clients.
///
/// # Example
///
/// ```ignore
/// use dataclients::prelude::*;
///
/// let clients = DataClients::load("clients.toml")?;
/// clients.upsert_documents("notes", &[Document::new("a", "hello world")])?;
/// let hits = clients.search_text("notes", "greeting", 5, None)?;
/// clients.close()?;
/// ```
pub struct DataClients {
    store: Box<dyn VectorStore>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl DataClients {
    /// Open clients from configuration.
    ///
    /// Store sessions open lazily, so this does not touch the network.
    pub fn open(config: ClientsConfig) -> Result<Self> {
        Self::builder()
            .store(config.store)
            .embedder_config(config.embedder)
            .open()
    }

    /// Open clients from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(ClientsConfig::load(path)?)
    }

    /// Create a builder.
    pub fn builder() -> DataClientsBuilder {
        DataClientsBuilder::new()
    }

    /// The vector store.
    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// The embedder, if one is configured.
    pub fn embedder(&self) -> Option<&dyn Embedder> {
        self.embedder.as_deref()
    }

    fn require_embedder(&self) -> Result<&dyn Embedder> {
        self.embedder()
            .ok_or(Error::Validation(ValidationError::MissingEmbedder))
    }

    /// Embed documents and write them, one batch call per slice.
    ///
    /// An empty slice writes nothing.
    pub fn upsert_documents(&self, collection: &str, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let vectors = self.require_embedder()?.embed_batch(&texts(documents))?;
        debug!(collection, count = documents.len(), "upserting documents");
        self.store
            .upsert(collection, &records(documents, vectors))
            .map_err(Error::from)
    }

    /// Write pre-embedded records.
    pub fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<()> {
        self.store.upsert(collection, records).map_err(Error::from)
    }

    /// Search with a text query.
    pub fn search_text(
        &self,
        collection: &str,
        text: &str,
        n_results: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<SearchResult>> {
        let query = self.require_embedder()?.embed_query(text)?;
        self.search(collection, &vector_request(query, n_results, filter))
    }

    /// Search with a prepared request.
    pub fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        self.store.search(collection, request).map_err(Error::from)
    }

    /// Fetch records by id, positionally.
    pub fn get(&self, collection: &str, ids: &[String]) -> Result<Vec<Option<VectorRecord>>> {
        self.store.get(collection, ids).map_err(Error::from)
    }

    /// Delete records by id.
    pub fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        self.store.delete(collection, ids).map_err(Error::from)
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        self.store.count(collection).map_err(Error::from)
    }

    /// Release the store session.
    pub fn close(&self) -> Result<()> {
        self.store.close().map_err(Error::from)
    }
}

/// Builder for [`DataClients`].
///
/// # Example
///
/// ```ignore
/// let clients = DataClients::builder()
///     .store(StoreConfig::new(Backend::ServerSync).with_qdrant_url("http://qdrant:6333"))
///     .embedder(EmbedderConfig::new(Provider::Ollama))
///     .open()?;
/// ```
#[derive(Default)]
pub struct DataClientsBuilder {
    store_config: StoreConfig,
    embedder_config: Option<EmbedderConfig>,
    store: Option<Box<dyn VectorStore>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl DataClientsBuilder {
    /// Create a builder for the default embedded-local store without an
    /// embedder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store configuration.
    pub fn store(mut self, config: StoreConfig) -> Self {
        self.store_config = config;
        self
    }

    /// Embedder configuration.
    pub fn embedder(mut self, config: EmbedderConfig) -> Self {
        self.embedder_config = Some(config);
        self
    }

    fn embedder_config(mut self, config: Option<EmbedderConfig>) -> Self {
        self.embedder_config = config;
        self
    }

    /// Use an already-built store; the store configuration is ignored.
    pub fn with_store(mut self, store: Box<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an already-built embedder; the embedder configuration is ignored.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the clients.
    pub fn open(self) -> Result<DataClients> {
        let embedder = match self.embedder {
            Some(embedder) => Some(embedder),
            None => http_embedder(self.embedder_config)?.map(|e| e as Arc<dyn Embedder>),
        };
        let store = match self.store {
            Some(store) => store,
            None => open_store(self.store_config, embedder.clone())?,
        };
        debug!(backend = store.backend(), embedder = embedder.is_some(), "clients ready");
        Ok(DataClients { store, embedder })
    }
}

/// Non-blocking clients.
///
/// Only the `server-async` backend is non-blocking; other backends are
/// rejected with a configuration error.
pub struct AsyncDataClients {
    store: Box<dyn AsyncVectorStore>,
    embedder: Option<Arc<dyn AsyncEmbedder>>,
}

impl AsyncDataClients {
    /// Open clients from configuration, verifying the server is reachable.
    pub async fn open(config: ClientsConfig) -> Result<Self> {
        config.validate()?;
        let embedder =
            http_embedder(config.embedder)?.map(|e| e as Arc<dyn AsyncEmbedder>);
        let store = open_async_store(config.store, embedder.clone()).await?;
        Ok(Self::from_parts(store, embedder))
    }

    /// Assemble clients from an already-open store.
    pub fn from_parts(
        store: Box<dyn AsyncVectorStore>,
        embedder: Option<Arc<dyn AsyncEmbedder>>,
    ) -> Self {
        AsyncDataClients { store, embedder }
    }

    /// The vector store.
    pub fn store(&self) -> &dyn AsyncVectorStore {
        self.store.as_ref()
    }

    fn require_embedder(&self) -> Result<&dyn AsyncEmbedder> {
        self.embedder
            .as_deref()
            .ok_or(Error::Validation(ValidationError::MissingEmbedder))
    }

    /// Embed documents and write them.
    pub async fn upsert_documents(&self, collection: &str, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let vectors = self
            .require_embedder()?
            .embed_batch(&texts(documents))
            .await?;
        debug!(collection, count = documents.len(), "upserting documents");
        self.store
            .upsert(collection, &records(documents, vectors))
            .await
            .map_err(Error::from)
    }

    /// Write pre-embedded records.
    pub async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<()> {
        self.store.upsert(collection, records).await.map_err(Error::from)
    }

    /// Search with a text query.
    pub async fn search_text(
        &self,
        collection: &str,
        text: &str,
        n_results: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<SearchResult>> {
        let query = self.require_embedder()?.embed_query(text).await?;
        self.search(collection, &vector_request(query, n_results, filter))
            .await
    }

    /// Search with a prepared request.
    pub async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>> {
        self.store.search(collection, request).await.map_err(Error::from)
    }

    /// Fetch records by id, positionally.
    pub async fn get(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Option<VectorRecord>>> {
        self.store.get(collection, ids).await.map_err(Error::from)
    }

    /// Delete records by id.
    pub async fn delete(&self, collection: &str, ids: &[String]) -> Result<()> {
        self.store.delete(collection, ids).await.map_err(Error::from)
    }

    /// Number of records in a collection.
    pub async fn count(&self, collection: &str) -> Result<usize> {
        self.store.count(collection).await.map_err(Error::from)
    }

    /// Release the client.
    pub async fn close(&self) -> Result<()> {
        self.store.close().await.map_err(Error::from)
    }
}
