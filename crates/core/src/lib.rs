//! Shared model for the dataclients workspace.
//!
//! This crate holds everything the embedding and vector-store clients agree on:
//!
//! - **VectorRecord / Payload**: the canonical unit written to a collection
//! - **DistanceMetric / CollectionConfig**: collection configuration, immutable after creation
//! - **Filter / Condition**: conjunctive payload filters
//! - **SearchRequest / SearchResult**: query shape and normalized results
//! - **ErrorKind / ValidationError**: the error taxonomy every client maps into
//! - **RetryPolicy**: the retry shim used around remote calls

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod metric;
pub mod record;
pub mod retry;
pub mod search;
pub mod validate;

pub use error::{ErrorKind, TransientKind, ValidationError};
pub use filter::{Condition, Filter, Range};
pub use metric::{CollectionConfig, CollectionInfo, DistanceMetric};
pub use record::{Payload, PayloadValue, VectorRecord};
pub use retry::{retry_async, retry_blocking, RetryPolicy, Retryable};
pub use search::{
    fetch_limit, rank_results, result_order, widen_fetch, Query, SearchRequest, SearchResult,
    TIE_WINDOW,
};
pub use validate::{
    clamp_n_results, validate_collection_name, validate_ids, validate_n_results,
    validate_records, validate_vector, RESERVED_PAYLOAD_KEYS,
};
