//! Vector records and their payloads
//!
//! A [`VectorRecord`] is what callers write into a collection: an id that is
//! stable across updates, the embedding, filterable payload, and optionally the
//! source text the embedding was computed from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar payload value
///
/// Only scalars are stored: both backends can filter on them, and neither
/// agrees with the other on nested structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl PayloadValue {
    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Bool(_) => "bool",
            PayloadValue::Int(_) => "int",
            PayloadValue::Float(_) => "float",
            PayloadValue::String(_) => "string",
        }
    }

    /// Numeric view (ints widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PayloadValue::Int(i) => Some(*i as f64),
            PayloadValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PayloadValue::Bool(b) => serde_json::Value::Bool(*b),
            PayloadValue::Int(i) => serde_json::Value::from(*i),
            PayloadValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PayloadValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Convert from a JSON value
    ///
    /// Returns `None` for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(PayloadValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PayloadValue::Int(i))
                } else {
                    n.as_f64().map(PayloadValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(PayloadValue::String(s.clone())),
            _ => None,
        }
    }

    /// Equality with numeric widening, so `Int(1)` equals `Float(1.0)`
    pub fn loosely_equals(&self, other: &PayloadValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        PayloadValue::Bool(v)
    }
}

impl From<i32> for PayloadValue {
    fn from(v: i32) -> Self {
        PayloadValue::Int(v as i64)
    }
}

impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        PayloadValue::Int(v)
    }
}

impl From<f32> for PayloadValue {
    fn from(v: f32) -> Self {
        PayloadValue::Float(v as f64)
    }
}

impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        PayloadValue::Float(v)
    }
}

impl From<String> for PayloadValue {
    fn from(v: String) -> Self {
        PayloadValue::String(v)
    }
}

impl From<&str> for PayloadValue {
    fn from(v: &str) -> Self {
        PayloadValue::String(v.to_string())
    }
}

/// Filterable metadata attached to a record
///
/// BTreeMap so serialization and iteration are deterministic.
pub type Payload = BTreeMap<String, PayloadValue>;

/// Convert a payload into a JSON object
pub fn payload_to_json(payload: &Payload) -> serde_json::Map<String, serde_json::Value> {
    payload
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

/// Convert a JSON object into a payload, skipping non-scalar values and the
/// given keys
pub fn payload_from_json(
    object: &serde_json::Map<String, serde_json::Value>,
    skip: &[&str],
) -> Payload {
    object
        .iter()
        .filter(|(k, _)| !skip.contains(&k.as_str()))
        .filter_map(|(k, v)| PayloadValue::from_json(v).map(|v| (k.clone(), v)))
        .collect()
}

/// The canonical unit stored in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique within a collection, stable across updates
    pub id: String,

    /// Embedding; every record in a collection has the same length
    pub vector: Vec<f32>,

    /// Filterable metadata
    #[serde(default)]
    pub payload: Payload,

    /// Source text, kept for traceability
    #[serde(default)]
    pub text: Option<String>,
}

impl VectorRecord {
    /// Create a record with an empty payload
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        VectorRecord {
            id: id.into(),
            vector,
            payload: Payload::new(),
            text: None,
        }
    }

    /// Create a record with a generated (v4 UUID) id
    pub fn with_generated_id(vector: Vec<f32>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), vector)
    }

    /// Replace the payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Add one payload field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Attach source text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Embedding dimensionality
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
