//! Vector Store Contract Test Suite
//!
//! Every scenario runs against every backend through the in-memory engines
//! from `dataclients_vectorstore::testing`:
//!
//! - `chroma`: embedded-local adapter over `MemoryChroma`
//! - `qdrant`: blocking server adapter over `MemoryQdrant`
//! - `qdrant-async`: non-blocking server adapter over `MemoryQdrant`,
//!   driven on a current-thread runtime
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test vectorstore_contract
//! cargo test --test vectorstore_contract filters::
//! ```

use std::sync::Arc;

use dataclients_core::{
    CollectionConfig, DistanceMetric, RetryPolicy, SearchRequest, SearchResult, VectorRecord,
};
use dataclients_embed::{AsyncEmbedder, Embedder};
use dataclients_vectorstore::testing::{FaultPlan, MemoryChroma, MemoryQdrant};
use dataclients_vectorstore::{
    AsyncQdrantStore, AsyncVectorStore, Backend, ChromaStore, QdrantStore, StoreConfig,
    VectorResult, VectorStore,
};
use tokio::runtime::Runtime;

// Test modules
mod basic_ops;
mod batching;
mod embedding;
mod filters;
mod invariants;
mod prune;
mod resilience;
mod search;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Which adapter a subject drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Chroma,
    Qdrant,
    QdrantAsync,
}

pub const ALL_KINDS: [Kind; 3] = [Kind::Chroma, Kind::Qdrant, Kind::QdrantAsync];

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Chroma => "chroma",
            Kind::Qdrant => "qdrant",
            Kind::QdrantAsync => "qdrant-async",
        }
    }
}

/// Backing engine; clones share state
#[derive(Clone)]
enum Engine {
    Chroma(MemoryChroma),
    Qdrant(MemoryQdrant),
}

enum Adapter {
    Sync(Box<dyn VectorStore>),
    Async(Runtime, Box<dyn AsyncVectorStore>),
}

/// Embedders handed to the adapters
#[derive(Clone, Default)]
pub struct Embedders {
    pub blocking: Option<Arc<dyn Embedder>>,
    pub nonblocking: Option<Arc<dyn AsyncEmbedder>>,
}

impl Embedders {
    /// The same embedder for both concurrency modes
    pub fn both<E>(embedder: Arc<E>) -> Self
    where
        E: Embedder + AsyncEmbedder + 'static,
    {
        let blocking: Arc<dyn Embedder> = embedder.clone();
        let nonblocking: Arc<dyn AsyncEmbedder> = embedder;
        Embedders {
            blocking: Some(blocking),
            nonblocking: Some(nonblocking),
        }
    }
}

/// One adapter under test with a blocking surface
pub struct Subject {
    pub kind: Kind,
    engine: Engine,
    adapter: Adapter,
}

/// Default config: dimension taken from the first write, cosine, no delays
pub fn store_config() -> StoreConfig {
    StoreConfig::new(Backend::ServerSync)
        .with_collection(CollectionConfig::inferred(DistanceMetric::Cosine))
        .with_retry(RetryPolicy::no_delay(3))
}

pub fn config_with(dimension: Option<usize>, metric: DistanceMetric) -> StoreConfig {
    store_config().with_collection(CollectionConfig { dimension, metric })
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

fn new_engine(kind: Kind, faults: FaultPlan) -> Engine {
    match kind {
        Kind::Chroma => Engine::Chroma(MemoryChroma::with_faults(faults)),
        Kind::Qdrant | Kind::QdrantAsync => Engine::Qdrant(MemoryQdrant::with_faults(faults)),
    }
}

impl Subject {
    /// Fresh engine, default config
    pub fn new(kind: Kind) -> Self {
        Self::open(kind, store_config(), FaultPlan::new()).expect("Failed to open subject")
    }

    /// Fresh engine with a config and failure script
    pub fn open(kind: Kind, config: StoreConfig, faults: FaultPlan) -> VectorResult<Self> {
        Self::attach(kind, new_engine(kind, faults), config, Embedders::default())
    }

    /// Fresh engine, default config, adapters holding `embedders`
    pub fn with_embedders(kind: Kind, embedders: Embedders) -> VectorResult<Self> {
        Self::attach(kind, new_engine(kind, FaultPlan::new()), store_config(), embedders)
    }

    /// Another adapter over the same engine, as a second process would see it
    pub fn reopen(&self, config: StoreConfig) -> VectorResult<Self> {
        Self::attach(self.kind, self.engine.clone(), config, Embedders::default())
    }

    fn attach(
        kind: Kind,
        engine: Engine,
        config: StoreConfig,
        embedders: Embedders,
    ) -> VectorResult<Self> {
        let adapter = match (&engine, kind) {
            (Engine::Chroma(api), _) => Adapter::Sync(Box::new(ChromaStore::with_api(
                config,
                Arc::new(api.clone()),
                embedders.blocking,
            )?)),
            (Engine::Qdrant(api), Kind::Qdrant) => Adapter::Sync(Box::new(QdrantStore::with_api(
                config,
                Arc::new(api.clone()),
                embedders.blocking,
            )?)),
            (Engine::Qdrant(api), _) => {
                let rt = runtime();
                let store = rt.block_on(AsyncQdrantStore::create_with_api(
                    config,
                    Arc::new(api.clone()),
                    embedders.nonblocking,
                ))?;
                Adapter::Async(rt, Box::new(store))
            }
        };
        Ok(Subject {
            kind,
            engine,
            adapter,
        })
    }

    /// Failure script shared with the engine
    pub fn faults(&self) -> &FaultPlan {
        match &self.engine {
            Engine::Chroma(api) => api.faults(),
            Engine::Qdrant(api) => api.faults(),
        }
    }

    /// Drop a collection behind the adapter's back
    pub fn drop_collection(&self, collection: &str) -> bool {
        match &self.engine {
            Engine::Chroma(api) => api.drop_collection(collection),
            Engine::Qdrant(api) => api.drop_collection(collection),
        }
    }

    pub fn upsert(&self, collection: &str, records: &[VectorRecord]) -> VectorResult<()> {
        match &self.adapter {
            Adapter::Sync(s) => s.upsert(collection, records),
            Adapter::Async(rt, s) => rt.block_on(s.upsert(collection, records)),
        }
    }

    pub fn search(&self, collection: &str, request: &SearchRequest) -> VectorResult<Vec<SearchResult>> {
        match &self.adapter {
            Adapter::Sync(s) => s.search(collection, request),
            Adapter::Async(rt, s) => rt.block_on(s.search(collection, request)),
        }
    }

    pub fn delete(&self, collection: &str, ids: &[String]) -> VectorResult<()> {
        match &self.adapter {
            Adapter::Sync(s) => s.delete(collection, ids),
            Adapter::Async(rt, s) => rt.block_on(s.delete(collection, ids)),
        }
    }

    pub fn get(&self, collection: &str, ids: &[String]) -> VectorResult<Vec<Option<VectorRecord>>> {
        match &self.adapter {
            Adapter::Sync(s) => s.get(collection, ids),
            Adapter::Async(rt, s) => rt.block_on(s.get(collection, ids)),
        }
    }

    pub fn count(&self, collection: &str) -> VectorResult<usize> {
        match &self.adapter {
            Adapter::Sync(s) => s.count(collection),
            Adapter::Async(rt, s) => rt.block_on(s.count(collection)),
        }
    }

    pub fn close(&self) -> VectorResult<()> {
        match &self.adapter {
            Adapter::Sync(s) => s.close(),
            Adapter::Async(rt, s) => rt.block_on(s.close()),
        }
    }

    /// Vector search helper
    pub fn query(&self, collection: &str, vector: &[f32], n_results: usize) -> Vec<SearchResult> {
        self.search(collection, &SearchRequest::vector(vector.to_vec(), n_results))
            .unwrap_or_else(|e| panic!("[{}] search failed: {}", self.kind.name(), e))
    }
}

/// Run a scenario against every backend with the default config
pub fn test_across_backends<F>(test_fn: F)
where
    F: Fn(&Subject),
{
    for kind in ALL_KINDS {
        let subject = Subject::new(kind);
        test_fn(&subject);
    }
}

/// Run a scenario against every backend and collect what it returns
pub fn collect_across_backends<T, F>(test_fn: F) -> Vec<(Kind, T)>
where
    F: Fn(&Subject) -> T,
{
    ALL_KINDS
        .iter()
        .map(|&kind| (kind, test_fn(&Subject::new(kind))))
        .collect()
}

/// Owned id list
pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Ids of a result list, in order
pub fn result_ids(results: &[SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.id.clone()).collect()
}

/// Unit vector along one axis
pub fn axis(dimension: usize, i: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimension];
    v[i % dimension] = 1.0;
    v
}

/// Unit vector at `degrees` in the first two dimensions
pub fn angle(degrees: f32) -> Vec<f32> {
    let r = degrees.to_radians();
    vec![r.cos(), r.sin()]
}

pub fn assert_close(a: f32, b: f32, context: &str) {
    assert!((a - b).abs() < 1e-5, "{}: {} != {}", context, a, b);
}
