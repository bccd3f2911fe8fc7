//! Native Chroma client seam
//!
//! Shapes mirror Chroma's REST API (`/api/v1`). The adapter only talks to a
//! [`ChromaApi`]; [`super::ChromaHttp`] is the production implementation.

use crate::native::NativeResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the HNSW space
pub const SPACE_KEY: &str = "hnsw:space";

/// Metadata key holding the collection dimensionality
pub const DIMENSION_KEY: &str = "dimension";

/// Collection as returned by Chroma
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromaCollection {
    /// Server-assigned id, used in record paths
    pub id: String,
    /// Collection name
    pub name: String,
    /// Collection metadata
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Records in column form, as Chroma sends and receives them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChromaRecords {
    /// Record ids
    pub ids: Vec<String>,
    /// Embeddings, when included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    /// Metadata per record (`None` for an empty payload)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Option<Map<String, Value>>>>,
    /// Source documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Option<String>>>,
}

/// Nearest-neighbour hits for one query embedding, nearest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromaHits {
    /// Record ids
    pub ids: Vec<String>,
    /// Native distances (lower is closer)
    pub distances: Vec<f32>,
    /// Metadata per hit
    pub metadatas: Vec<Option<Map<String, Value>>>,
    /// Document per hit
    pub documents: Vec<Option<String>>,
    /// Embedding per hit, when requested
    pub embeddings: Option<Vec<Vec<f32>>>,
}

/// Native Chroma operations
pub trait ChromaApi: Send + Sync {
    /// Liveness probe
    fn heartbeat(&self) -> NativeResult<()>;

    /// Largest write the server accepts, if it advertises one
    fn max_batch_size(&self) -> NativeResult<Option<usize>>;

    /// Look up a collection by name
    fn get_collection(&self, name: &str) -> NativeResult<Option<ChromaCollection>>;

    /// Create a collection
    fn create_collection(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> NativeResult<ChromaCollection>;

    /// Insert or replace records
    fn upsert(&self, collection_id: &str, records: &ChromaRecords) -> NativeResult<()>;

    /// Nearest neighbours of one embedding
    fn query(
        &self,
        collection_id: &str,
        embedding: &[f32],
        n_results: usize,
        where_filter: Option<&Value>,
        include_embeddings: bool,
    ) -> NativeResult<ChromaHits>;

    /// Fetch records by id, or every record when `ids` is `None`
    ///
    /// Records come back in server order; missing ids are absent.
    fn get(
        &self,
        collection_id: &str,
        ids: Option<&[String]>,
        include_embeddings: bool,
    ) -> NativeResult<ChromaRecords>;

    /// Delete records by id
    fn delete(&self, collection_id: &str, ids: &[String]) -> NativeResult<()>;

    /// Record count
    fn count(&self, collection_id: &str) -> NativeResult<usize>;
}
