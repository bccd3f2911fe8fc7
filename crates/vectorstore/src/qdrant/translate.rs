//! Translation between the shared model and Qdrant's native shapes
//!
//! Qdrant point ids must be UUIDs or integers, so a record id is mapped to
//! a deterministic UUIDv5 and kept verbatim in the `_id` payload key. The
//! record text travels in `_text`.

use super::api::{PointId, QdrantPoint, VectorParams};
use dataclients_core::metric::euclidean_score;
use dataclients_core::record::{payload_from_json, payload_to_json};
use dataclients_core::{Condition, DistanceMetric, Filter, PayloadValue, ValidationError, VectorRecord};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Payload key holding the record id
pub const ID_KEY: &str = "_id";
/// Payload key holding the record text
pub const TEXT_KEY: &str = "_text";

const TARGET: &str = "qdrant";

// Namespace for record id -> point id
const ID_NAMESPACE: Uuid = Uuid::from_u128(0x4f1c3a2e_8d5b_4c7a_9e21_7b3f5d9a0c64);

/// Deterministic point id for a record id
pub fn point_id(record_id: &str) -> String {
    Uuid::new_v5(&ID_NAMESPACE, record_id.as_bytes()).to_string()
}

/// Native distance name
pub fn distance_name(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::Cosine => "Cosine",
        DistanceMetric::DotProduct => "Dot",
        DistanceMetric::Euclidean => "Euclid",
    }
}

/// Metric for a native distance name
pub fn metric_for(distance: &str) -> Option<DistanceMetric> {
    match distance {
        "Cosine" => Some(DistanceMetric::Cosine),
        "Dot" => Some(DistanceMetric::DotProduct),
        "Euclid" => Some(DistanceMetric::Euclidean),
        _ => None,
    }
}

/// Collection parameters for a dimension and metric
pub fn vector_params(dimension: usize, metric: DistanceMetric) -> VectorParams {
    VectorParams {
        size: dimension,
        distance: distance_name(metric).to_string(),
    }
}

/// Convert a native score to "higher = more similar"
///
/// Cosine and Dot scores already are; Euclid reports the distance.
pub fn normalize_score(metric: DistanceMetric, score: f32) -> f32 {
    match metric {
        DistanceMetric::Cosine | DistanceMetric::DotProduct => score,
        DistanceMetric::Euclidean => euclidean_score(score),
    }
}

/// Native point for a record
pub fn to_point(record: &VectorRecord) -> QdrantPoint {
    let mut payload = payload_to_json(&record.payload);
    payload.insert(ID_KEY.to_string(), json!(record.id));
    if let Some(text) = &record.text {
        payload.insert(TEXT_KEY.to_string(), json!(text));
    }
    QdrantPoint {
        id: point_id(&record.id),
        vector: record.vector.clone(),
        payload,
    }
}

/// Record id, text and payload from a native payload
///
/// Points written by other clients have no `_id`; their point id stands in.
pub fn split_payload(
    id: &PointId,
    payload: Option<&Map<String, Value>>,
) -> (String, Option<String>, dataclients_core::Payload) {
    let Some(payload) = payload else {
        return (id.to_string(), None, Default::default());
    };
    let record_id = payload
        .get(ID_KEY)
        .and_then(Value::as_str)
        .map_or_else(|| id.to_string(), str::to_string);
    let text = payload
        .get(TEXT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string);
    (record_id, text, payload_from_json(payload, &[ID_KEY, TEXT_KEY]))
}

/// Record from a retrieved point
pub fn to_record(id: &PointId, payload: Option<&Map<String, Value>>, vector: Option<Vec<f32>>) -> VectorRecord {
    let (id, text, payload) = split_payload(id, payload);
    VectorRecord {
        id,
        vector: vector.unwrap_or_default(),
        payload,
        text,
    }
}

fn unsupported(field: &str, condition: &Condition) -> ValidationError {
    ValidationError::UnsupportedFilter {
        field: field.to_string(),
        operator: condition.operator().to_string(),
        target: TARGET.to_string(),
    }
}

// Floats cannot be matched exactly; equality becomes a closed range
fn equals(field: &str, value: &PayloadValue) -> Value {
    match value {
        PayloadValue::Float(f) => json!({ "key": field, "range": { "gte": f, "lte": f } }),
        other => json!({ "key": field, "match": { "value": other.to_json() } }),
    }
}

/// Translate a filter into a native filter
///
/// `NotEq` also requires the key to be present, matching records that
/// carry another value only.
pub fn filter(filter: &Filter) -> Result<Option<Value>, ValidationError> {
    filter.validate()?;
    let mut must = Vec::new();
    let mut must_not = Vec::new();
    for (field, condition) in filter.iter() {
        match condition {
            Condition::Eq(v) => must.push(equals(field, v)),
            Condition::NotEq(v) => {
                must_not.push(equals(field, v));
                must_not.push(json!({ "is_empty": { "key": field } }));
            }
            Condition::Range(range) => {
                let bounds: Map<String, Value> = range
                    .bounds()
                    .into_iter()
                    .map(|(op, bound)| (op.trim_start_matches('$').to_string(), json!(bound)))
                    .collect();
                must.push(json!({ "key": field, "range": bounds }));
            }
            Condition::AnyOf(values) => match values.first() {
                Some(PayloadValue::String(_)) | Some(PayloadValue::Int(_)) => {
                    let values: Vec<Value> = values.iter().map(PayloadValue::to_json).collect();
                    must.push(json!({ "key": field, "match": { "any": values } }));
                }
                _ => return Err(unsupported(field, condition)),
            },
            Condition::Prefix(_) => return Err(unsupported(field, condition)),
        }
    }
    if must.is_empty() && must_not.is_empty() {
        return Ok(None);
    }
    let mut native = Map::new();
    if !must.is_empty() {
        native.insert("must".to_string(), Value::Array(must));
    }
    if !must_not.is_empty() {
        native.insert("must_not".to_string(), Value::Array(must_not));
    }
    Ok(Some(Value::Object(native)))
}
