//! Plumbing shared by the blocking and non-blocking Qdrant stores
//!
//! Validation, translation, collection checks and ranking live here so
//! the two stores differ only in how they sequence I/O.

use super::api::{RetrievedPoint, ScoredPoint, SearchPoints, VectorParams};
use super::translate::{metric_for, normalize_score, point_id, split_payload, to_record, vector_params};
use crate::config::StoreConfig;
use crate::error::{VectorError, VectorResult};
use crate::store::{check_dimension, positional};
use dataclients_core::{
    clamp_n_results, fetch_limit, rank_results, result_order, validate_collection_name,
    validate_ids, validate_n_results, validate_records, widen_fetch, CollectionInfo,
    SearchRequest, SearchResult, VectorRecord,
};
use serde_json::Value;
use std::collections::HashSet;

pub(crate) const BACKEND: &str = "qdrant";

/// Records per write unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Check a collection's parameters against the config
///
/// Runs on every resolve; collection parameters are read from the server
/// each call since another client may drop and recreate the collection.
pub(crate) fn check_collection(
    config: &StoreConfig,
    name: &str,
    params: &VectorParams,
) -> VectorResult<CollectionInfo> {
    let requested = &config.collection;
    let metric = metric_for(&params.distance).ok_or_else(|| {
        VectorError::conflict_found(
            name,
            requested,
            format!("dimension {}, distance {}", params.size, params.distance),
        )
    })?;
    let info = CollectionInfo {
        name: name.to_string(),
        dimension: params.size,
        metric,
    };
    if requested.conflict_with(&info).is_some() {
        return Err(VectorError::conflict(name, requested, &info));
    }
    Ok(info)
}

/// Parameters for a collection created by a write of `dimension`
pub(crate) fn create_params(config: &StoreConfig, dimension: usize) -> VectorParams {
    vector_params(
        config.collection.dimension.unwrap_or(dimension),
        config.collection.metric,
    )
}

/// Validate an upsert; `None` means there is nothing to write
pub(crate) fn check_upsert(
    config: &StoreConfig,
    collection: &str,
    records: &[VectorRecord],
) -> VectorResult<Option<usize>> {
    validate_collection_name(collection)?;
    let dimension = validate_records(records)?;
    if let (Some(expected), Some(got)) = (config.collection.dimension, dimension) {
        check_dimension(expected, got)?;
    }
    Ok(dimension)
}

pub(crate) fn batch_size(config: &StoreConfig) -> usize {
    config.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
}

/// Validated search parameters, before the query vector is known
#[derive(Debug)]
pub(crate) struct SearchPlan {
    pub filter: Option<Value>,
    pub n_results: usize,
    pub limit: usize,
    pub max: usize,
}

pub(crate) fn plan_search(
    config: &StoreConfig,
    collection: &str,
    request: &SearchRequest,
) -> VectorResult<SearchPlan> {
    validate_collection_name(collection)?;
    validate_n_results(request.n_results)?;
    let filter = match request.effective_filter() {
        Some(filter) => super::translate::filter(filter)?,
        None => None,
    };
    let max = config.max_n_results();
    let n_results = clamp_n_results(request.n_results, max, BACKEND);
    Ok(SearchPlan {
        filter,
        n_results,
        limit: fetch_limit(n_results, max),
        max,
    })
}

impl SearchPlan {
    pub(crate) fn points(&self, vector: &[f32], limit: usize, with_vectors: bool) -> SearchPoints {
        SearchPoints {
            vector: vector.to_vec(),
            limit,
            filter: self.filter.clone(),
            with_payload: true,
            with_vector: with_vectors,
        }
    }

    /// Rank a fetch of `limit` hits
    ///
    /// `Err` carries a wider limit when the fetch may have cut the tie
    /// group at the `n_results` boundary.
    pub(crate) fn settle(
        &self,
        hits: Vec<ScoredPoint>,
        info: &CollectionInfo,
        limit: usize,
    ) -> Result<Vec<SearchResult>, usize> {
        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| {
                let (id, text, payload) = split_payload(&hit.id, hit.payload.as_ref());
                SearchResult {
                    id,
                    score: normalize_score(info.metric, hit.score),
                    payload,
                    text,
                    vector: hit.vector,
                }
            })
            .collect();
        results.sort_by(result_order);
        match widen_fetch(&results, self.n_results, limit, self.max) {
            Some(wider) => Err(wider),
            None => Ok(rank_results(results, self.n_results)),
        }
    }
}

/// Validate ids for get/delete and map them to unique point ids
pub(crate) fn point_ids(collection: &str, ids: &[String]) -> VectorResult<Vec<String>> {
    validate_collection_name(collection)?;
    validate_ids(ids)?;
    let mut seen = HashSet::with_capacity(ids.len());
    Ok(ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .map(|id| point_id(id))
        .collect())
}

/// Positional records for a get
pub(crate) fn finish_get(ids: &[String], points: Vec<RetrievedPoint>) -> Vec<Option<VectorRecord>> {
    let records = points
        .into_iter()
        .map(|p| to_record(&p.id, p.payload.as_ref(), p.vector))
        .collect();
    positional(ids, records)
}
