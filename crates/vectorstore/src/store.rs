//! The vector store contract
//!
//! [`VectorStore`] is the blocking form, [`AsyncVectorStore`] the
//! non-blocking one. Every adapter implements one of them with identical
//! observable semantics:
//!
//! - **upsert**: insert-or-replace by id, full overwrite. All records share
//!   one dimensionality equal to the collection's; a mismatch is rejected
//!   before anything is written. Writes are split into sub-batches; if one
//!   fails after others succeeded the error is `PartialUpsert`.
//! - **search**: results ordered by score descending, ties by ascending id.
//!   A missing collection yields no results.
//! - **delete**: idempotent; missing ids or collections are not errors.
//! - **get**: positional; `None` for ids that do not exist.
//! - **count**: 0 for a missing collection.

use crate::error::VectorResult;
use async_trait::async_trait;
use dataclients_core::{
    validate_vector, Query, SearchRequest, SearchResult, ValidationError, VectorRecord,
};
use dataclients_embed::{AsyncEmbedder, Embedder};
use std::collections::HashMap;

/// Blocking vector store
pub trait VectorStore: Send + Sync {
    /// Backend name for logs and errors
    fn backend(&self) -> &'static str;

    /// Insert or replace records
    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> VectorResult<()>;

    /// Similarity search
    fn search(&self, collection: &str, request: &SearchRequest) -> VectorResult<Vec<SearchResult>>;

    /// Delete records by id
    fn delete(&self, collection: &str, ids: &[String]) -> VectorResult<()>;

    /// Fetch records by id, positionally
    fn get(&self, collection: &str, ids: &[String]) -> VectorResult<Vec<Option<VectorRecord>>>;

    /// Number of records in a collection
    fn count(&self, collection: &str) -> VectorResult<usize>;

    /// Release the session; later calls fail with a backend fault
    fn close(&self) -> VectorResult<()>;
}

/// Non-blocking vector store
#[async_trait]
pub trait AsyncVectorStore: Send + Sync {
    /// Backend name for logs and errors
    fn backend(&self) -> &'static str;

    /// Insert or replace records
    async fn upsert(&self, collection: &str, records: &[VectorRecord]) -> VectorResult<()>;

    /// Similarity search
    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> VectorResult<Vec<SearchResult>>;

    /// Delete records by id
    async fn delete(&self, collection: &str, ids: &[String]) -> VectorResult<()>;

    /// Fetch records by id, positionally
    async fn get(
        &self,
        collection: &str,
        ids: &[String],
    ) -> VectorResult<Vec<Option<VectorRecord>>>;

    /// Number of records in a collection
    async fn count(&self, collection: &str) -> VectorResult<usize>;

    /// Release the client; later calls fail with a backend fault
    async fn close(&self) -> VectorResult<()>;
}

/// Query vector for a request, embedding text queries
pub(crate) fn query_vector(
    query: &Query,
    embedder: Option<&dyn Embedder>,
) -> VectorResult<Vec<f32>> {
    let vector = match query {
        Query::Vector(v) => v.clone(),
        Query::Text(text) => embedder
            .ok_or(ValidationError::MissingEmbedder)?
            .embed_query(text)?,
    };
    validate_vector("query", &vector)?;
    Ok(vector)
}

/// Query vector for a request, embedding text queries without blocking
pub(crate) async fn query_vector_async(
    query: &Query,
    embedder: Option<&dyn AsyncEmbedder>,
) -> VectorResult<Vec<f32>> {
    let vector = match query {
        Query::Vector(v) => v.clone(),
        Query::Text(text) => {
            embedder
                .ok_or(ValidationError::MissingEmbedder)?
                .embed_query(text)
                .await?
        }
    };
    validate_vector("query", &vector)?;
    Ok(vector)
}

/// Reject vectors whose length differs from the collection's
pub(crate) fn check_dimension(expected: usize, got: usize) -> VectorResult<()> {
    if expected != got {
        return Err(ValidationError::DimensionMismatch { expected, got }.into());
    }
    Ok(())
}

/// Arrange fetched records in the order of the requested ids
pub(crate) fn positional(ids: &[String], found: Vec<VectorRecord>) -> Vec<Option<VectorRecord>> {
    let by_id: HashMap<String, VectorRecord> =
        found.into_iter().map(|r| (r.id.clone(), r)).collect();
    ids.iter().map(|id| by_id.get(id).cloned()).collect()
}
