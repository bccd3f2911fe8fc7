//! Qdrant adapter, blocking

use super::api::QdrantApi;
use super::common::{
    batch_size, check_collection, check_upsert, create_params, finish_get, plan_search,
    point_ids, BACKEND,
};
use super::http::QdrantHttp;
use super::translate::to_point;
use crate::batch::write_batches;
use crate::config::StoreConfig;
use crate::error::{VectorError, VectorResult};
use crate::native::NativeResult;
use crate::store::{check_dimension, query_vector, VectorStore};
use dataclients_core::{retry_blocking, CollectionInfo, SearchRequest, SearchResult, VectorRecord};
use dataclients_embed::Embedder;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

enum Connector {
    Http,
    Api(Arc<dyn QdrantApi>),
}

/// Vector store on a Qdrant server, blocking
///
/// Connectivity is resolved on the first call.
pub struct QdrantStore {
    config: StoreConfig,
    embedder: Option<Arc<dyn Embedder>>,
    connector: Connector,
    client: Mutex<Option<Arc<dyn QdrantApi>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore")
            .field("url", &self.config.qdrant.url)
            .field("has_embedder", &self.embedder.is_some())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl QdrantStore {
    /// Store talking to Qdrant over HTTP
    pub fn new(config: StoreConfig, embedder: Option<Arc<dyn Embedder>>) -> VectorResult<Self> {
        Self::with_connector(config, Connector::Http, embedder)
    }

    /// Store over an arbitrary native client
    pub fn with_api(
        config: StoreConfig,
        api: Arc<dyn QdrantApi>,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> VectorResult<Self> {
        Self::with_connector(config, Connector::Api(api), embedder)
    }

    fn with_connector(
        config: StoreConfig,
        connector: Connector,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> VectorResult<Self> {
        config.validate()?;
        Ok(QdrantStore {
            config,
            embedder,
            connector,
            client: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    fn client(&self) -> VectorResult<Arc<dyn QdrantApi>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(VectorError::fault(BACKEND, "store is closed"));
        }
        let mut slot = self.client.lock();
        if let Some(api) = slot.as_ref() {
            return Ok(Arc::clone(api));
        }
        let api: Arc<dyn QdrantApi> = match &self.connector {
            Connector::Api(api) => Arc::clone(api),
            Connector::Http => Arc::new(
                QdrantHttp::new(
                    &self.config.qdrant.url,
                    self.config.qdrant.api_key.clone(),
                    self.config.timeout(),
                )
                .map_err(|e| e.into_session_error(BACKEND))?,
            ),
        };
        retry_blocking(&self.config.retry, "qdrant.health", || {
            api.health().map_err(|e| e.into_session_error(BACKEND))
        })?;
        info!(url = %self.config.qdrant.url, "qdrant client connected");
        *slot = Some(Arc::clone(&api));
        Ok(api)
    }

    fn call<T>(&self, operation: &str, mut f: impl FnMut() -> NativeResult<T>) -> VectorResult<T> {
        retry_blocking(&self.config.retry, operation, || {
            f().map_err(|e| e.into_vector_error(BACKEND))
        })
    }

    fn resolve(&self, api: &dyn QdrantApi, name: &str) -> VectorResult<Option<CollectionInfo>> {
        match self.call("qdrant.collection", || api.collection(name))? {
            Some(params) => check_collection(&self.config, name, &params).map(Some),
            None => Ok(None),
        }
    }

    fn resolve_or_create(
        &self,
        api: &dyn QdrantApi,
        name: &str,
        dimension: usize,
    ) -> VectorResult<CollectionInfo> {
        if let Some(info) = self.resolve(api, name)? {
            return Ok(info);
        }
        let params = create_params(&self.config, dimension);
        match self.call("qdrant.create_collection", || api.create_collection(name, &params)) {
            Ok(()) => {
                info!(collection = name, dimension = params.size, distance = %params.distance, "created qdrant collection");
                check_collection(&self.config, name, &params)
            }
            // Lost a creation race: use the collection the other writer made
            Err(create_err) => match self.call("qdrant.collection", || api.collection(name))? {
                Some(existing) => check_collection(&self.config, name, &existing),
                None => Err(create_err),
            },
        }
    }
}

impl VectorStore for QdrantStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> VectorResult<()> {
        let Some(dimension) = check_upsert(&self.config, collection, records)? else {
            return Ok(());
        };
        let api = self.client()?;
        let info = self.resolve_or_create(api.as_ref(), collection, dimension)?;
        check_dimension(info.dimension, dimension)?;

        write_batches(records, batch_size(&self.config), |chunk| {
            let points: Vec<_> = chunk.iter().map(to_point).collect();
            self.call("qdrant.upsert", || api.upsert_points(collection, &points))
        })?;
        debug!(collection, records = records.len(), "qdrant upsert");
        Ok(())
    }

    fn search(&self, collection: &str, request: &SearchRequest) -> VectorResult<Vec<SearchResult>> {
        let plan = plan_search(&self.config, collection, request)?;
        let vector = query_vector(&request.query, self.embedder.as_deref())?;
        let api = self.client()?;
        let Some(info) = self.resolve(api.as_ref(), collection)? else {
            return Ok(Vec::new());
        };
        check_dimension(info.dimension, vector.len())?;

        let mut limit = plan.limit;
        loop {
            let body = plan.points(&vector, limit, request.with_vectors);
            let hits = self.call("qdrant.search", || api.search(collection, &body))?;
            match plan.settle(hits, &info, limit) {
                Ok(results) => return Ok(results),
                Err(wider) => {
                    debug!(collection, limit = wider, "tie group at result boundary, widening search");
                    limit = wider;
                }
            }
        }
    }

    fn delete(&self, collection: &str, ids: &[String]) -> VectorResult<()> {
        let points = point_ids(collection, ids)?;
        if points.is_empty() {
            return Ok(());
        }
        let api = self.client()?;
        if self.resolve(api.as_ref(), collection)?.is_none() {
            return Ok(());
        }
        for chunk in points.chunks(batch_size(&self.config)) {
            self.call("qdrant.delete", || api.delete_points(collection, chunk))?;
        }
        Ok(())
    }

    fn get(&self, collection: &str, ids: &[String]) -> VectorResult<Vec<Option<VectorRecord>>> {
        let points = point_ids(collection, ids)?;
        if points.is_empty() {
            return Ok(Vec::new());
        }
        let api = self.client()?;
        if self.resolve(api.as_ref(), collection)?.is_none() {
            return Ok(vec![None; ids.len()]);
        }
        let found = self.call("qdrant.retrieve", || api.retrieve(collection, &points, true))?;
        Ok(finish_get(ids, found))
    }

    fn count(&self, collection: &str) -> VectorResult<usize> {
        dataclients_core::validate_collection_name(collection)?;
        let api = self.client()?;
        match self.resolve(api.as_ref(), collection)? {
            Some(_) => self.call("qdrant.count", || api.count(collection)),
            None => Ok(0),
        }
    }

    fn close(&self) -> VectorResult<()> {
        self.closed.store(true, Ordering::Release);
        if self.client.lock().take().is_some() {
            debug!("qdrant client closed");
        }
        Ok(())
    }
}
