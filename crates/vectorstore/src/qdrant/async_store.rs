//! Qdrant adapter, non-blocking
//!
//! Mirrors [`super::QdrantStore`] call for call; only the I/O is awaited.
//! Construction is two-phase: [`AsyncQdrantStore::create`] checks the server
//! is healthy before handing out a store.

use super::api::AsyncQdrantApi;
use super::common::{
    batch_size, check_collection, check_upsert, create_params, finish_get, plan_search,
    point_ids, BACKEND,
};
use super::http::AsyncQdrantHttp;
use super::translate::to_point;
use crate::batch::partial_failure;
use crate::config::StoreConfig;
use crate::error::{VectorError, VectorResult};
use crate::native::NativeResult;
use crate::store::{check_dimension, query_vector_async, AsyncVectorStore};
use async_trait::async_trait;
use dataclients_core::{
    retry_async, validate_collection_name, CollectionInfo, SearchRequest, SearchResult,
    VectorRecord,
};
use dataclients_embed::AsyncEmbedder;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Vector store on a Qdrant server, non-blocking
pub struct AsyncQdrantStore {
    config: StoreConfig,
    embedder: Option<Arc<dyn AsyncEmbedder>>,
    client: RwLock<Option<Arc<dyn AsyncQdrantApi>>>,
}

impl std::fmt::Debug for AsyncQdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncQdrantStore")
            .field("url", &self.config.qdrant.url)
            .field("has_embedder", &self.embedder.is_some())
            .field("closed", &self.client.read().is_none())
            .finish()
    }
}

impl AsyncQdrantStore {
    /// Connect over HTTP and verify the server is healthy
    pub async fn create(
        config: StoreConfig,
        embedder: Option<Arc<dyn AsyncEmbedder>>,
    ) -> VectorResult<Self> {
        config.validate()?;
        let http = AsyncQdrantHttp::new(
            &config.qdrant.url,
            config.qdrant.api_key.clone(),
            config.timeout(),
        )
        .map_err(|e| e.into_session_error(BACKEND))?;
        Self::create_with_api(config, Arc::new(http), embedder).await
    }

    /// Wrap an arbitrary native client, verifying it is healthy
    pub async fn create_with_api(
        config: StoreConfig,
        api: Arc<dyn AsyncQdrantApi>,
        embedder: Option<Arc<dyn AsyncEmbedder>>,
    ) -> VectorResult<Self> {
        config.validate()?;
        retry_async(&config.retry, "qdrant.health", || {
            let api = Arc::clone(&api);
            async move { api.health().await.map_err(|e| e.into_session_error(BACKEND)) }
        })
        .await?;
        info!(url = %config.qdrant.url, "async qdrant client connected");
        Ok(AsyncQdrantStore {
            config,
            embedder,
            client: RwLock::new(Some(api)),
        })
    }

    fn client(&self) -> VectorResult<Arc<dyn AsyncQdrantApi>> {
        let guard = self.client.read();
        guard
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| VectorError::fault(BACKEND, "store is closed"))
    }

    async fn call<T, F, Fut>(&self, operation: &str, mut f: F) -> VectorResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = NativeResult<T>> + Send,
        T: Send,
    {
        retry_async(&self.config.retry, operation, || {
            let pending = f();
            async move { pending.await.map_err(|e| e.into_vector_error(BACKEND)) }
        })
        .await
    }

    async fn resolve(
        &self,
        api: &dyn AsyncQdrantApi,
        name: &str,
    ) -> VectorResult<Option<CollectionInfo>> {
        match self.call("qdrant.collection", || api.collection(name)).await? {
            Some(params) => check_collection(&self.config, name, &params).map(Some),
            None => Ok(None),
        }
    }

    async fn resolve_or_create(
        &self,
        api: &dyn AsyncQdrantApi,
        name: &str,
        dimension: usize,
    ) -> VectorResult<CollectionInfo> {
        if let Some(info) = self.resolve(api, name).await? {
            return Ok(info);
        }
        let params = create_params(&self.config, dimension);
        let created = self
            .call("qdrant.create_collection", || api.create_collection(name, &params))
            .await;
        match created {
            Ok(()) => {
                info!(collection = name, dimension = params.size, distance = %params.distance, "created qdrant collection");
                check_collection(&self.config, name, &params)
            }
            // Lost a creation race: use the collection the other writer made
            Err(create_err) => match self.call("qdrant.collection", || api.collection(name)).await? {
                Some(existing) => check_collection(&self.config, name, &existing),
                None => Err(create_err),
            },
        }
    }
}

#[async_trait]
impl AsyncVectorStore for AsyncQdrantStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> VectorResult<()> {
        let Some(dimension) = check_upsert(&self.config, collection, records)? else {
            return Ok(());
        };
        let api = self.client()?;
        let info = self.resolve_or_create(api.as_ref(), collection, dimension).await?;
        check_dimension(info.dimension, dimension)?;

        let mut written = 0;
        for chunk in records.chunks(batch_size(&self.config)) {
            let points: Vec<_> = chunk.iter().map(to_point).collect();
            if let Err(e) = self
                .call("qdrant.upsert", || api.upsert_points(collection, &points))
                .await
            {
                return Err(partial_failure(records, written, e));
            }
            written += chunk.len();
        }
        debug!(collection, records = records.len(), "qdrant upsert");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> VectorResult<Vec<SearchResult>> {
        let plan = plan_search(&self.config, collection, request)?;
        let vector = query_vector_async(&request.query, self.embedder.as_deref()).await?;
        let api = self.client()?;
        let Some(info) = self.resolve(api.as_ref(), collection).await? else {
            return Ok(Vec::new());
        };
        check_dimension(info.dimension, vector.len())?;

        let mut limit = plan.limit;
        loop {
            let body = plan.points(&vector, limit, request.with_vectors);
            let hits = self
                .call("qdrant.search", || api.search(collection, &body))
                .await?;
            match plan.settle(hits, &info, limit) {
                Ok(results) => return Ok(results),
                Err(wider) => {
                    debug!(collection, limit = wider, "tie group at result boundary, widening search");
                    limit = wider;
                }
            }
        }
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> VectorResult<()> {
        let points = point_ids(collection, ids)?;
        if points.is_empty() {
            return Ok(());
        }
        let api = self.client()?;
        if self.resolve(api.as_ref(), collection).await?.is_none() {
            return Ok(());
        }
        for chunk in points.chunks(batch_size(&self.config)) {
            self.call("qdrant.delete", || api.delete_points(collection, chunk))
                .await?;
        }
        Ok(())
    }

    async fn get(
        &self,
        collection: &str,
        ids: &[String],
    ) -> VectorResult<Vec<Option<VectorRecord>>> {
        let points = point_ids(collection, ids)?;
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let api = self.client()?;
        if self.resolve(api.as_ref(), collection).await?.is_none() {
            return Ok(vec![None; ids.len()]);
        }
        let found = self
            .call("qdrant.retrieve", || api.retrieve(collection, &points, true))
            .await?;
        Ok(finish_get(ids, found))
    }

    async fn count(&self, collection: &str) -> VectorResult<usize> {
        validate_collection_name(collection)?;
        let api = self.client()?;
        match self.resolve(api.as_ref(), collection).await? {
            Some(_) => self.call("qdrant.count", || api.count(collection)).await,
            None => Ok(0),
        }
    }

    async fn close(&self) -> VectorResult<()> {
        let client = self.client.write().take();
        if client.is_some() {
            debug!("async qdrant client closed");
        }
        Ok(())
    }
}
