//! In-memory Qdrant
//!
//! One state serves both the blocking and the non-blocking seam. Emulated
//! server behaviour: vectors normalized on write for `Cosine`, Euclid scores
//! reported as distances, `must`/`must_not` filters with `match`, `range`
//! and `is_empty`, 409 on re-creating a collection. Equal scores come back
//! in reverse insertion order.

use super::faults::{FaultPlan, Op};
use crate::native::{NativeError, NativeResult};
use crate::qdrant::{
    AsyncQdrantApi, PointId, QdrantApi, QdrantPoint, RetrievedPoint, ScoredPoint, SearchPoints,
    VectorParams,
};
use async_trait::async_trait;
use dataclients_core::metric::{dot, l2_distance, norm};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Point {
    id: String,
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

#[derive(Debug)]
struct Collection {
    params: VectorParams,
    points: Vec<Point>,
}

impl Collection {
    fn prepare(&self, vector: &[f32]) -> Vec<f32> {
        if self.params.distance != "Cosine" {
            return vector.to_vec();
        }
        let n = norm(vector);
        if n == 0.0 {
            return vector.to_vec();
        }
        vector.iter().map(|x| x / n).collect()
    }
}

fn missing(name: &str) -> NativeError {
    NativeError::status(404, format!("Collection `{}` doesn't exist!", name))
}

/// Qdrant server held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryQdrant {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
    faults: FaultPlan,
}

impl MemoryQdrant {
    /// Empty server
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty server following a failure script
    pub fn with_faults(faults: FaultPlan) -> Self {
        MemoryQdrant {
            faults,
            ..Self::default()
        }
    }

    /// The failure script
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// Drop a collection as another client would; false if it was absent
    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.lock().remove(name).is_some()
    }
}

fn value_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => match (a.as_i64(), e.as_i64()) {
            (Some(a), Some(e)) => a == e,
            _ => false,
        },
        _ => actual == expected,
    }
}

fn in_range(actual: &Value, range: &Map<String, Value>) -> bool {
    let Some(x) = actual.as_f64() else {
        return false;
    };
    range.iter().all(|(op, bound)| {
        let Some(b) = bound.as_f64() else {
            return false;
        };
        match op.as_str() {
            "gt" => x > b,
            "gte" => x >= b,
            "lt" => x < b,
            "lte" => x <= b,
            _ => false,
        }
    })
}

fn condition_holds(condition: &Value, payload: &Map<String, Value>) -> bool {
    if let Some(key) = condition.pointer("/is_empty/key").and_then(Value::as_str) {
        return match payload.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        };
    }
    let Some(key) = condition.get("key").and_then(Value::as_str) else {
        return false;
    };
    let Some(actual) = payload.get(key) else {
        return false;
    };
    if let Some(expected) = condition.pointer("/match/value") {
        return value_equals(actual, expected);
    }
    if let Some(any) = condition.pointer("/match/any").and_then(Value::as_array) {
        return any.iter().any(|e| value_equals(actual, e));
    }
    if let Some(range) = condition.get("range").and_then(Value::as_object) {
        return in_range(actual, range);
    }
    false
}

fn filter_holds(filter: Option<&Value>, payload: &Map<String, Value>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let clauses = |name: &str| {
        filter
            .get(name)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    clauses("must").iter().all(|c| condition_holds(c, payload))
        && !clauses("must_not").iter().any(|c| condition_holds(c, payload))
}

impl QdrantApi for MemoryQdrant {
    fn health(&self) -> NativeResult<()> {
        self.faults.check(Op::Health)
    }

    fn collection(&self, name: &str) -> NativeResult<Option<VectorParams>> {
        self.faults.check(Op::GetCollection)?;
        Ok(self.collections.lock().get(name).map(|c| c.params.clone()))
    }

    fn create_collection(&self, name: &str, params: &VectorParams) -> NativeResult<()> {
        self.faults.check(Op::CreateCollection)?;
        let mut collections = self.collections.lock();
        if collections.contains_key(name) {
            return Err(NativeError::status(
                409,
                format!("Collection `{}` already exists!", name),
            ));
        }
        collections.insert(
            name.to_string(),
            Collection {
                params: params.clone(),
                points: Vec::new(),
            },
        );
        Ok(())
    }

    fn upsert_points(&self, name: &str, points: &[QdrantPoint]) -> NativeResult<()> {
        self.faults.check(Op::Upsert)?;
        let mut collections = self.collections.lock();
        let collection = collections.get_mut(name).ok_or_else(|| missing(name))?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != collection.params.size) {
            return Err(NativeError::status(
                400,
                format!(
                    "Wrong input: Vector dimension error: expected dim: {}, got {}",
                    collection.params.size,
                    bad.vector.len()
                ),
            ));
        }
        for point in points {
            let stored = Point {
                id: point.id.clone(),
                vector: collection.prepare(&point.vector),
                payload: point.payload.clone(),
            };
            collection.points.retain(|p| p.id != point.id);
            collection.points.push(stored);
        }
        Ok(())
    }

    fn search(&self, name: &str, search: &SearchPoints) -> NativeResult<Vec<ScoredPoint>> {
        self.faults.check(Op::Query)?;
        let collections = self.collections.lock();
        let collection = collections.get(name).ok_or_else(|| missing(name))?;
        let query = collection.prepare(&search.vector);
        let euclid = collection.params.distance == "Euclid";

        let mut scored: Vec<(usize, f32, &Point)> = collection
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| filter_holds(search.filter.as_ref(), &p.payload))
            .map(|(i, p)| {
                let score = if euclid {
                    l2_distance(&query, &p.vector)
                } else {
                    dot(&query, &p.vector)
                };
                (i, score, p)
            })
            .collect();
        scored.sort_by(|a, b| {
            let by_score = if euclid {
                a.1.total_cmp(&b.1)
            } else {
                b.1.total_cmp(&a.1)
            };
            by_score.then(b.0.cmp(&a.0))
        });
        scored.truncate(search.limit);

        Ok(scored
            .into_iter()
            .map(|(_, score, p)| ScoredPoint {
                id: PointId::Uuid(p.id.clone()),
                score,
                payload: Some(p.payload.clone()),
                vector: search.with_vector.then(|| p.vector.clone()),
            })
            .collect())
    }

    fn retrieve(
        &self,
        name: &str,
        ids: &[String],
        with_vector: bool,
    ) -> NativeResult<Vec<RetrievedPoint>> {
        self.faults.check(Op::Get)?;
        let collections = self.collections.lock();
        let collection = collections.get(name).ok_or_else(|| missing(name))?;
        Ok(collection
            .points
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| RetrievedPoint {
                id: PointId::Uuid(p.id.clone()),
                payload: Some(p.payload.clone()),
                vector: with_vector.then(|| p.vector.clone()),
            })
            .collect())
    }

    fn delete_points(&self, name: &str, ids: &[String]) -> NativeResult<()> {
        self.faults.check(Op::Delete)?;
        let mut collections = self.collections.lock();
        let collection = collections.get_mut(name).ok_or_else(|| missing(name))?;
        collection.points.retain(|p| !ids.contains(&p.id));
        Ok(())
    }

    fn count(&self, name: &str) -> NativeResult<usize> {
        self.faults.check(Op::Count)?;
        let collections = self.collections.lock();
        Ok(collections.get(name).ok_or_else(|| missing(name))?.points.len())
    }
}

#[async_trait]
impl AsyncQdrantApi for MemoryQdrant {
    async fn health(&self) -> NativeResult<()> {
        QdrantApi::health(self)
    }

    async fn collection(&self, name: &str) -> NativeResult<Option<VectorParams>> {
        QdrantApi::collection(self, name)
    }

    async fn create_collection(&self, name: &str, params: &VectorParams) -> NativeResult<()> {
        QdrantApi::create_collection(self, name, params)
    }

    async fn upsert_points(&self, name: &str, points: &[QdrantPoint]) -> NativeResult<()> {
        QdrantApi::upsert_points(self, name, points)
    }

    async fn search(&self, name: &str, search: &SearchPoints) -> NativeResult<Vec<ScoredPoint>> {
        QdrantApi::search(self, name, search)
    }

    async fn retrieve(
        &self,
        name: &str,
        ids: &[String],
        with_vector: bool,
    ) -> NativeResult<Vec<RetrievedPoint>> {
        QdrantApi::retrieve(self, name, ids, with_vector)
    }

    async fn delete_points(&self, name: &str, ids: &[String]) -> NativeResult<()> {
        QdrantApi::delete_points(self, name, ids)
    }

    async fn count(&self, name: &str) -> NativeResult<usize> {
        QdrantApi::count(self, name)
    }
}
