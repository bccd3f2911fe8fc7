//! Chroma adapter
//!
//! Chroma is the embedded-local backend: a server process on this machine,
//! optionally spawned by the adapter, persisting into a local directory.

mod api;
mod http;
mod process;
mod prune;
mod store;
mod translate;

pub use api::{ChromaApi, ChromaCollection, ChromaHits, ChromaRecords, DIMENSION_KEY, SPACE_KEY};
pub use http::ChromaHttp;
pub use process::LocalChromaServer;
pub use prune::{expired_ids, RetentionPolicy, RetentionTier, DATE_KEY, RETENTION_KEY, WEIGHT_KEY};
pub use store::{ChromaStore, DEFAULT_BATCH_SIZE};
pub use translate::{collection_info, distance_to_score, metric_for, space_for, where_filter};
