//! Native Qdrant client seams
//!
//! Shapes mirror Qdrant's REST API. [`QdrantApi`] is the blocking seam,
//! [`AsyncQdrantApi`] the non-blocking one; the HTTP implementations live in
//! [`super::http`].

use crate::native::NativeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Point id as Qdrant returns it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// UUID in hyphenated form
    Uuid(String),
    /// Unsigned integer id (never written by this crate)
    Num(u64),
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointId::Uuid(s) => f.write_str(s),
            PointId::Num(n) => write!(f, "{}", n),
        }
    }
}

/// Vector configuration of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorParams {
    /// Dimensionality
    pub size: usize,
    /// `Cosine`, `Dot`, `Euclid` or `Manhattan`
    pub distance: String,
}

/// Point written by an upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QdrantPoint {
    /// UUID point id
    pub id: String,
    /// Dense vector
    pub vector: Vec<f32>,
    /// Payload, including the reserved `_id` and `_text` keys
    pub payload: Map<String, Value>,
}

/// Search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// Point id
    pub id: PointId,
    /// Native score (a distance for `Euclid`)
    pub score: f32,
    /// Payload
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
    /// Stored vector, when requested
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
}

/// Point returned by a retrieve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPoint {
    /// Point id
    pub id: PointId,
    /// Payload
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
    /// Stored vector, when requested
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
}

/// Body of a search call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPoints {
    /// Query vector
    pub vector: Vec<f32>,
    /// Candidates to return
    pub limit: usize,
    /// Native filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Always true
    pub with_payload: bool,
    /// Return stored vectors
    pub with_vector: bool,
}

/// Blocking native Qdrant operations
pub trait QdrantApi: Send + Sync {
    /// Liveness probe
    fn health(&self) -> NativeResult<()>;

    /// Vector configuration of a collection, `None` when it does not exist
    fn collection(&self, name: &str) -> NativeResult<Option<VectorParams>>;

    /// Create a collection
    fn create_collection(&self, name: &str, params: &VectorParams) -> NativeResult<()>;

    /// Insert or replace points, waiting for the write to apply
    fn upsert_points(&self, name: &str, points: &[QdrantPoint]) -> NativeResult<()>;

    /// Nearest neighbours
    fn search(&self, name: &str, search: &SearchPoints) -> NativeResult<Vec<ScoredPoint>>;

    /// Points by id; missing ids are absent
    fn retrieve(
        &self,
        name: &str,
        ids: &[String],
        with_vector: bool,
    ) -> NativeResult<Vec<RetrievedPoint>>;

    /// Delete points by id
    fn delete_points(&self, name: &str, ids: &[String]) -> NativeResult<()>;

    /// Exact point count
    fn count(&self, name: &str) -> NativeResult<usize>;
}

/// Non-blocking native Qdrant operations
#[async_trait]
pub trait AsyncQdrantApi: Send + Sync {
    /// Liveness probe
    async fn health(&self) -> NativeResult<()>;

    /// Vector configuration of a collection, `None` when it does not exist
    async fn collection(&self, name: &str) -> NativeResult<Option<VectorParams>>;

    /// Create a collection
    async fn create_collection(&self, name: &str, params: &VectorParams) -> NativeResult<()>;

    /// Insert or replace points, waiting for the write to apply
    async fn upsert_points(&self, name: &str, points: &[QdrantPoint]) -> NativeResult<()>;

    /// Nearest neighbours
    async fn search(&self, name: &str, search: &SearchPoints) -> NativeResult<Vec<ScoredPoint>>;

    /// Points by id; missing ids are absent
    async fn retrieve(
        &self,
        name: &str,
        ids: &[String],
        with_vector: bool,
    ) -> NativeResult<Vec<RetrievedPoint>>;

    /// Delete points by id
    async fn delete_points(&self, name: &str, ids: &[String]) -> NativeResult<()>;

    /// Exact point count
    async fn count(&self, name: &str) -> NativeResult<usize>;
}
