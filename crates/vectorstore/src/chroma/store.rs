//! Chroma adapter (embedded-local, blocking)

use super::api::{ChromaApi, ChromaCollection};
use super::http::ChromaHttp;
use super::process::LocalChromaServer;
use super::prune::{expired_ids, RetentionPolicy};
use super::translate::{collection_info, collection_metadata, from_records, hits_to_results, to_records, where_filter};
use crate::batch::{effective_batch_size, write_batches};
use crate::config::StoreConfig;
use crate::error::{VectorError, VectorResult};
use crate::native::NativeResult;
use crate::store::{check_dimension, positional, query_vector, VectorStore};
use chrono::{NaiveDate, Utc};
use dataclients_core::{
    clamp_n_results, fetch_limit, rank_results, result_order, retry_blocking,
    validate_collection_name, validate_ids, validate_n_results, validate_records, widen_fetch,
    CollectionInfo, SearchRequest, SearchResult, VectorRecord,
};
use dataclients_embed::Embedder;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const BACKEND: &str = "chroma";

/// Records per write when neither config nor server says otherwise
pub const DEFAULT_BATCH_SIZE: usize = 5000;

enum Connector {
    Http,
    Api(Arc<dyn ChromaApi>),
}

struct Session {
    api: Arc<dyn ChromaApi>,
    batch_size: usize,
    // Dropped with the session, which stops the child
    _server: Option<LocalChromaServer>,
}

/// A collection as resolved for one call
#[derive(Debug, Clone)]
struct Handle {
    id: String,
    info: CollectionInfo,
}

/// Vector store on Chroma
///
/// The session (HTTP client and, when configured, a spawned local server)
/// is opened on the first operation. The session mutex is held only while
/// opening; operations run on a shared handle to it. Collections are
/// looked up by name on every call.
pub struct ChromaStore {
    config: StoreConfig,
    embedder: Option<Arc<dyn Embedder>>,
    connector: Connector,
    session: Mutex<Option<Arc<Session>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for ChromaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromaStore")
            .field("url", &self.config.chroma.base_url())
            .field("spawn", &self.config.chroma.spawn)
            .field("has_embedder", &self.embedder.is_some())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl ChromaStore {
    /// Store talking to Chroma over HTTP
    pub fn new(config: StoreConfig, embedder: Option<Arc<dyn Embedder>>) -> VectorResult<Self> {
        Self::with_connector(config, Connector::Http, embedder)
    }

    /// Store over an arbitrary native client
    pub fn with_api(
        config: StoreConfig,
        api: Arc<dyn ChromaApi>,
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
        Ok(ChromaStore {
            config,
            embedder,
            connector,
            session: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    fn session(&self) -> VectorResult<Arc<Session>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(VectorError::fault(BACKEND, "store is closed"));
        }
        let mut slot = self.session.lock();
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(self.connect()?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    fn connect(&self) -> VectorResult<Session> {
        let (api, server): (Arc<dyn ChromaApi>, Option<LocalChromaServer>) = match &self.connector {
            Connector::Api(api) => (Arc::clone(api), None),
            Connector::Http => {
                let http = ChromaHttp::new(&self.config.chroma.base_url(), self.config.timeout())
                    .map_err(|e| e.into_session_error(BACKEND))?;
                let server = if self.config.chroma.spawn {
                    Some(LocalChromaServer::start(&self.config.chroma, &http)?)
                } else {
                    None
                };
                (Arc::new(http), server)
            }
        };

        let retry = &self.config.retry;
        retry_blocking(retry, "chroma.heartbeat", || {
            api.heartbeat().map_err(|e| e.into_session_error(BACKEND))
        })?;
        let server_max = retry_blocking(retry, "chroma.pre_flight", || {
            api.max_batch_size().map_err(|e| e.into_session_error(BACKEND))
        })?;
        let batch_size = effective_batch_size(self.config.batch_size, DEFAULT_BATCH_SIZE, server_max);
        info!(
            url = %self.config.chroma.base_url(),
            batch_size,
            spawned = server.is_some(),
            "chroma session opened"
        );
        Ok(Session {
            api,
            batch_size,
            _server: server,
        })
    }

    fn call<T>(&self, operation: &str, mut f: impl FnMut() -> NativeResult<T>) -> VectorResult<T> {
        retry_blocking(&self.config.retry, operation, || {
            f().map_err(|e| e.into_vector_error(BACKEND))
        })
    }

    fn resolve(&self, session: &Session, name: &str) -> VectorResult<Option<Handle>> {
        match self.call("chroma.get_collection", || session.api.get_collection(name))? {
            Some(collection) => self.handle_for(name, collection).map(Some),
            None => Ok(None),
        }
    }

    fn handle_for(&self, name: &str, collection: ChromaCollection) -> VectorResult<Handle> {
        let requested = &self.config.collection;
        let info = collection_info(&collection)
            .map_err(|found| VectorError::conflict_found(name, requested, found))?;
        if requested.conflict_with(&info).is_some() {
            return Err(VectorError::conflict(name, requested, &info));
        }
        Ok(Handle {
            id: collection.id,
            info,
        })
    }

    fn resolve_or_create(&self, session: &Session, name: &str, dimension: usize) -> VectorResult<Handle> {
        if let Some(handle) = self.resolve(session, name)? {
            return Ok(handle);
        }
        let dimension = self.config.collection.dimension.unwrap_or(dimension);
        let metric = self.config.collection.metric;
        let metadata = collection_metadata(dimension, metric);
        match self.call("chroma.create_collection", || {
            session.api.create_collection(name, metadata.clone())
        }) {
            Ok(collection) => {
                info!(collection = name, dimension, metric = %metric, "created chroma collection");
                self.handle_for(name, collection)
            }
            // Lost a creation race: use the collection the other writer made
            Err(create_err) => {
                match self.call("chroma.get_collection", || session.api.get_collection(name))? {
                    Some(collection) => self.handle_for(name, collection),
                    None => Err(create_err),
                }
            }
        }
    }

    /// Delete records past their retention
    ///
    /// See [`RetentionPolicy`] for how a record's age limit is chosen.
    /// Returns the number of records deleted.
    pub fn prune(&self, collection: &str, policy: &RetentionPolicy) -> VectorResult<usize> {
        self.prune_at(collection, policy, Utc::now().date_naive())
    }

    /// [`ChromaStore::prune`] as of a given day
    pub fn prune_at(
        &self,
        collection: &str,
        policy: &RetentionPolicy,
        today: NaiveDate,
    ) -> VectorResult<usize> {
        validate_collection_name(collection)?;
        let session = self.session()?;
        let Some(handle) = self.resolve(&session, collection)? else {
            return Ok(0);
        };
        let records = self.call("chroma.get", || session.api.get(&handle.id, None, false))?;
        let expired = expired_ids(&records, policy, today);
        for chunk in expired.chunks(session.batch_size) {
            self.call("chroma.delete", || session.api.delete(&handle.id, chunk))?;
        }
        info!(
            collection,
            scanned = records.ids.len(),
            deleted = expired.len(),
            "pruned chroma collection"
        );
        Ok(expired.len())
    }
}

fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

impl VectorStore for ChromaStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> VectorResult<()> {
        validate_collection_name(collection)?;
        let Some(dimension) = validate_records(records)? else {
            return Ok(());
        };
        if let Some(expected) = self.config.collection.dimension {
            check_dimension(expected, dimension)?;
        }
        let session = self.session()?;
        let handle = self.resolve_or_create(&session, collection, dimension)?;
        check_dimension(handle.info.dimension, dimension)?;

        write_batches(records, session.batch_size, |chunk| {
            let columns = to_records(chunk);
            self.call("chroma.upsert", || session.api.upsert(&handle.id, &columns))
        })?;
        debug!(collection, records = records.len(), "chroma upsert");
        Ok(())
    }

    fn search(&self, collection: &str, request: &SearchRequest) -> VectorResult<Vec<SearchResult>> {
        validate_collection_name(collection)?;
        validate_n_results(request.n_results)?;
        let clause = match request.effective_filter() {
            Some(filter) => where_filter(filter)?,
            None => None,
        };
        let vector = query_vector(&request.query, self.embedder.as_deref())?;

        let session = self.session()?;
        let Some(handle) = self.resolve(&session, collection)? else {
            return Ok(Vec::new());
        };
        check_dimension(handle.info.dimension, vector.len())?;

        let max = self.config.max_n_results();
        let n_results = clamp_n_results(request.n_results, max, BACKEND);
        let mut limit = fetch_limit(n_results, max);
        loop {
            let hits = self.call("chroma.query", || {
                session
                    .api
                    .query(&handle.id, &vector, limit, clause.as_ref(), request.with_vectors)
            })?;
            let mut results = hits_to_results(hits, handle.info.metric);
            results.sort_by(result_order);
            match widen_fetch(&results, n_results, limit, max) {
                Some(wider) => {
                    debug!(collection, limit = wider, "tie group at result boundary, widening query");
                    limit = wider;
                }
                None => return Ok(rank_results(results, n_results)),
            }
        }
    }

    fn delete(&self, collection: &str, ids: &[String]) -> VectorResult<()> {
        validate_collection_name(collection)?;
        validate_ids(ids)?;
        if ids.is_empty() {
            return Ok(());
        }
        let session = self.session()?;
        let Some(handle) = self.resolve(&session, collection)? else {
            return Ok(());
        };
        for chunk in unique_ids(ids).chunks(session.batch_size) {
            self.call("chroma.delete", || session.api.delete(&handle.id, chunk))?;
        }
        Ok(())
    }

    fn get(&self, collection: &str, ids: &[String]) -> VectorResult<Vec<Option<VectorRecord>>> {
        validate_collection_name(collection)?;
        validate_ids(ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let session = self.session()?;
        let Some(handle) = self.resolve(&session, collection)? else {
            return Ok(vec![None; ids.len()]);
        };
        let wanted = unique_ids(ids);
        let found = self.call("chroma.get", || session.api.get(&handle.id, Some(&wanted), true))?;
        Ok(positional(ids, from_records(found)))
    }

    fn count(&self, collection: &str) -> VectorResult<usize> {
        validate_collection_name(collection)?;
        let session = self.session()?;
        match self.resolve(&session, collection)? {
            Some(handle) => self.call("chroma.count", || session.api.count(&handle.id)),
            None => Ok(0),
        }
    }

    fn close(&self) -> VectorResult<()> {
        self.closed.store(true, Ordering::Release);
        let session = self.session.lock().take();
        if session.is_some() {
            debug!("chroma session closed");
        }
        Ok(())
    }
}
