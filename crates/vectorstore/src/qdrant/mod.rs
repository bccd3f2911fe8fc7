//! Qdrant adapters
//!
//! [`QdrantStore`] (blocking) and [`AsyncQdrantStore`] (non-blocking) share
//! validation, translation, batching and ranking through `common`.

mod api;
mod async_store;
mod common;
mod http;
mod store;
mod translate;

pub use api::{
    AsyncQdrantApi, PointId, QdrantApi, QdrantPoint, RetrievedPoint, ScoredPoint, SearchPoints,
    VectorParams,
};
pub use async_store::AsyncQdrantStore;
pub use common::DEFAULT_BATCH_SIZE;
pub use http::{AsyncQdrantHttp, QdrantHttp};
pub use store::QdrantStore;
pub use translate::{distance_name, metric_for, normalize_score, point_id, ID_KEY, TEXT_KEY};
