//! Translation between the shared model and Chroma's native shapes

use super::api::{ChromaCollection, ChromaHits, ChromaRecords, DIMENSION_KEY, SPACE_KEY};
use dataclients_core::metric::euclidean_score;
use dataclients_core::record::{payload_from_json, payload_to_json};
use dataclients_core::{
    CollectionInfo, Condition, DistanceMetric, Filter, SearchResult, ValidationError, VectorRecord,
};
use serde_json::{json, Map, Value};

const TARGET: &str = "chroma";

/// HNSW space name for a metric
pub fn space_for(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::Cosine => "cosine",
        DistanceMetric::DotProduct => "ip",
        DistanceMetric::Euclidean => "l2",
    }
}

/// Metric for an HNSW space name
pub fn metric_for(space: &str) -> Option<DistanceMetric> {
    match space {
        "cosine" => Some(DistanceMetric::Cosine),
        "ip" => Some(DistanceMetric::DotProduct),
        "l2" => Some(DistanceMetric::Euclidean),
        _ => None,
    }
}

/// Metadata recorded on collections this adapter creates
pub fn collection_metadata(dimension: usize, metric: DistanceMetric) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(SPACE_KEY.to_string(), json!(space_for(metric)));
    metadata.insert(DIMENSION_KEY.to_string(), json!(dimension));
    metadata
}

/// Read dimension and metric back from collection metadata
///
/// Chroma defaults to `l2` when no space was given. A collection without a
/// recorded dimension was not created by this adapter; the error describes
/// what was found.
pub fn collection_info(collection: &ChromaCollection) -> Result<CollectionInfo, String> {
    let empty = Map::new();
    let metadata = collection.metadata.as_ref().unwrap_or(&empty);
    let space = metadata
        .get(SPACE_KEY)
        .and_then(Value::as_str)
        .unwrap_or("l2");
    let metric = metric_for(space).ok_or_else(|| format!("unsupported space '{}'", space))?;
    let dimension = metadata
        .get(DIMENSION_KEY)
        .and_then(Value::as_u64)
        .ok_or_else(|| format!("unknown dimension, metric {}", metric))?;
    Ok(CollectionInfo {
        name: collection.name.clone(),
        dimension: dimension as usize,
        metric,
    })
}

/// Convert a native distance to "higher = more similar"
///
/// Chroma reports `1 - cos` for cosine, `1 - dot` for ip and the squared L2
/// distance for l2.
pub fn distance_to_score(metric: DistanceMetric, distance: f32) -> f32 {
    match metric {
        DistanceMetric::Cosine | DistanceMetric::DotProduct => 1.0 - distance,
        DistanceMetric::Euclidean => euclidean_score(distance.max(0.0).sqrt()),
    }
}

/// Translate a filter into a `where` clause
///
/// Every condition becomes one or more clauses joined with `$and`.
/// Prefix matching has no metadata operator and is rejected.
pub fn where_filter(filter: &Filter) -> Result<Option<Value>, ValidationError> {
    filter.validate()?;
    let mut clauses = Vec::with_capacity(filter.len());
    for (field, condition) in filter.iter() {
        match condition {
            Condition::Eq(v) => clauses.push(json!({ field: { "$eq": v.to_json() } })),
            Condition::NotEq(v) => clauses.push(json!({ field: { "$ne": v.to_json() } })),
            Condition::Range(range) => {
                for (op, bound) in range.bounds() {
                    clauses.push(json!({ field: { op: bound } }));
                }
            }
            Condition::AnyOf(values) => {
                let values: Vec<Value> = values.iter().map(|v| v.to_json()).collect();
                clauses.push(json!({ field: { "$in": values } }));
            }
            Condition::Prefix(_) => {
                return Err(ValidationError::UnsupportedFilter {
                    field: field.clone(),
                    operator: condition.operator().to_string(),
                    target: TARGET.to_string(),
                })
            }
        }
    }
    Ok(match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "$and": clauses })),
    })
}

/// Column-form write for a batch of records
///
/// Empty payloads are sent as `null`; Chroma rejects empty metadata maps.
pub fn to_records(records: &[VectorRecord]) -> ChromaRecords {
    ChromaRecords {
        ids: records.iter().map(|r| r.id.clone()).collect(),
        embeddings: Some(records.iter().map(|r| r.vector.clone()).collect()),
        metadatas: Some(
            records
                .iter()
                .map(|r| (!r.payload.is_empty()).then(|| payload_to_json(&r.payload)))
                .collect(),
        ),
        documents: Some(records.iter().map(|r| r.text.clone()).collect()),
    }
}

/// Row-form records from a native get
pub fn from_records(records: ChromaRecords) -> Vec<VectorRecord> {
    let n = records.ids.len();
    let mut embeddings = records.embeddings.unwrap_or_default().into_iter();
    let mut metadatas = records.metadatas.unwrap_or_default().into_iter();
    let mut documents = records.documents.unwrap_or_default().into_iter();
    let mut out = Vec::with_capacity(n);
    for id in records.ids {
        let vector = embeddings.next().unwrap_or_default();
        let payload = metadatas
            .next()
            .flatten()
            .map(|m| payload_from_json(&m, &[]))
            .unwrap_or_default();
        let text = documents.next().flatten();
        out.push(VectorRecord {
            id,
            vector,
            payload,
            text,
        });
    }
    out
}

/// Normalized results from native hits
pub fn hits_to_results(hits: ChromaHits, metric: DistanceMetric) -> Vec<SearchResult> {
    let mut embeddings = hits.embeddings.map(Vec::into_iter);
    hits.ids
        .into_iter()
        .zip(hits.distances)
        .zip(hits.metadatas.into_iter().zip(hits.documents))
        .map(|((id, distance), (metadata, text))| SearchResult {
            id,
            score: distance_to_score(metric, distance),
            payload: metadata
                .map(|m| payload_from_json(&m, &[]))
                .unwrap_or_default(),
            text,
            vector: embeddings.as_mut().and_then(Iterator::next),
        })
        .collect()
}
