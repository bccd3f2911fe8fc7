//! Search requests and normalized results
//!
//! Every adapter returns results ranked by [`rank_results`]: score
//! descending, ties broken by ascending id. Adapters ask their backend for
//! [`TIE_WINDOW`] extra candidates, and keep widening the fetch with
//! [`widen_fetch`] while a tie group may continue past it, so ties
//! straddling the `n_results` boundary are resolved here, not by
//! backend-internal ordering.

use crate::filter::Filter;
use crate::record::Payload;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Extra candidates fetched beyond `n_results` for deterministic tie-breaks
pub const TIE_WINDOW: usize = 16;

/// What to search with
///
/// Exactly one of a vector or a text; text is routed through the store's
/// embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Query by embedding
    Vector(Vec<f32>),
    /// Query by text
    Text(String),
}

/// Similarity search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query vector or text
    pub query: Query,
    /// Maximum results to return (must be > 0)
    pub n_results: usize,
    /// Optional conjunctive payload filter
    pub filter: Option<Filter>,
    /// Return stored vectors with each result
    pub with_vectors: bool,
}

impl SearchRequest {
    /// Search by vector
    pub fn vector(query: Vec<f32>, n_results: usize) -> Self {
        SearchRequest {
            query: Query::Vector(query),
            n_results,
            filter: None,
            with_vectors: false,
        }
    }

    /// Search by text
    pub fn text(query: impl Into<String>, n_results: usize) -> Self {
        SearchRequest {
            query: Query::Text(query.into()),
            n_results,
            filter: None,
            with_vectors: false,
        }
    }

    /// Attach a payload filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Request stored vectors in the results
    pub fn with_vectors(mut self, with_vectors: bool) -> Self {
        self.with_vectors = with_vectors;
        self
    }

    /// Filter, treating an empty filter as none
    pub fn effective_filter(&self) -> Option<&Filter> {
        self.filter.as_ref().filter(|f| !f.is_empty())
    }
}

/// Search result entry
///
/// Score is always "higher = more similar" regardless of what the backend
/// reports natively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Record id
    pub id: String,
    /// Normalized similarity score
    pub score: f32,
    /// Record payload
    pub payload: Payload,
    /// Source text, if stored
    pub text: Option<String>,
    /// Stored vector, if requested
    pub vector: Option<Vec<f32>>,
}

/// Ordering used for all results: score descending, id ascending
pub fn result_order(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// Sort results and keep the best `n_results`
pub fn rank_results(mut results: Vec<SearchResult>, n_results: usize) -> Vec<SearchResult> {
    results.sort_by(result_order);
    results.truncate(n_results);
    results
}

/// How many candidates to ask a backend for
pub fn fetch_limit(n_results: usize, max: usize) -> usize {
    n_results.saturating_add(TIE_WINDOW).min(max)
}

/// Larger candidate count when a fetch may have cut a tie group
///
/// `fetched` is a ranked fetch of at most `limit` candidates. When the
/// backend filled the window and its last score equals the score at the
/// `n_results` boundary, records tied at that score with smaller ids may
/// be missing. The window then doubles, up to `max`.
pub fn widen_fetch(
    fetched: &[SearchResult],
    n_results: usize,
    limit: usize,
    max: usize,
) -> Option<usize> {
    if fetched.len() < limit || limit >= max || n_results == 0 {
        return None;
    }
    let boundary = fetched.get(n_results - 1)?.score;
    let last = fetched.last()?.score;
    last.total_cmp(&boundary)
        .is_eq()
        .then(|| limit.saturating_mul(2).min(max))
}
