//! In-memory Chroma
//!
//! Emulates the server behaviour the adapter relies on: native distances per
//! HNSW space, `where` evaluation, server-side batch limits, records
//! returned in storage order. Equal distances come back in reverse
//! insertion order so callers cannot lean on backend tie ordering.

use super::faults::{FaultPlan, Op};
use crate::chroma::{ChromaApi, ChromaCollection, ChromaHits, ChromaRecords, SPACE_KEY};
use crate::native::{NativeError, NativeResult};
use dataclients_core::metric::{dot, l2_distance};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Stored {
    id: String,
    embedding: Vec<f32>,
    metadata: Option<Map<String, Value>>,
    document: Option<String>,
}

#[derive(Debug)]
struct Collection {
    meta: ChromaCollection,
    records: Vec<Stored>,
}

impl Collection {
    fn space(&self) -> String {
        self.meta
            .metadata
            .as_ref()
            .and_then(|m| m.get(SPACE_KEY))
            .and_then(Value::as_str)
            .unwrap_or("l2")
            .to_string()
    }
}

#[derive(Debug, Default)]
struct State {
    collections: Vec<Collection>,
    next_id: u64,
    last_where: Option<Value>,
}

impl State {
    fn by_id(&mut self, id: &str) -> NativeResult<&mut Collection> {
        self.collections
            .iter_mut()
            .find(|c| c.meta.id == id)
            .ok_or_else(|| NativeError::status(404, format!("Collection {} does not exist.", id)))
    }
}

/// Chroma server held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryChroma {
    state: Arc<Mutex<State>>,
    faults: FaultPlan,
    max_batch: Option<usize>,
}

impl MemoryChroma {
    /// Empty server
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty server following a failure script
    pub fn with_faults(faults: FaultPlan) -> Self {
        MemoryChroma {
            faults,
            ..Self::default()
        }
    }

    /// Advertise and enforce a maximum write size
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch = Some(max);
        self
    }

    /// The failure script
    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    /// `where` clause of the most recent query
    pub fn last_where(&self) -> Option<Value> {
        self.state.lock().last_where.clone()
    }

    /// Drop a collection as another client would; false if it was absent
    pub fn drop_collection(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.collections.len();
        state.collections.retain(|c| c.meta.name != name);
        state.collections.len() != before
    }
}

fn distance(space: &str, a: &[f32], b: &[f32]) -> f32 {
    match space {
        "cosine" => 1.0 - dataclients_core::metric::cosine_similarity(a, b),
        "ip" => 1.0 - dot(a, b),
        _ => {
            let d = l2_distance(a, b);
            d * d
        }
    }
}

fn compare(op: &str, actual: &Value, expected: &Value) -> bool {
    match op {
        "$eq" => loosely_equal(actual, expected),
        "$ne" => !loosely_equal(actual, expected),
        "$gt" | "$gte" | "$lt" | "$lte" => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => match op {
                "$gt" => a > e,
                "$gte" => a >= e,
                "$lt" => a < e,
                _ => a <= e,
            },
            _ => false,
        },
        "$in" => expected
            .as_array()
            .is_some_and(|values| values.iter().any(|v| loosely_equal(actual, v))),
        _ => false,
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Evaluate a `where` clause; records lacking a key never match a clause on it
fn matches(clause: &Value, metadata: Option<&Map<String, Value>>) -> bool {
    let Some(clause) = clause.as_object() else {
        return false;
    };
    clause.iter().all(|(key, spec)| {
        if key == "$and" {
            return spec
                .as_array()
                .is_some_and(|clauses| clauses.iter().all(|c| matches(c, metadata)));
        }
        let Some(actual) = metadata.and_then(|m| m.get(key)) else {
            return false;
        };
        match spec.as_object() {
            Some(ops) => ops.iter().all(|(op, expected)| compare(op, actual, expected)),
            None => loosely_equal(actual, spec),
        }
    })
}

impl ChromaApi for MemoryChroma {
    fn heartbeat(&self) -> NativeResult<()> {
        self.faults.check(Op::Health)
    }

    fn max_batch_size(&self) -> NativeResult<Option<usize>> {
        Ok(self.max_batch)
    }

    fn get_collection(&self, name: &str) -> NativeResult<Option<ChromaCollection>> {
        self.faults.check(Op::GetCollection)?;
        let state = self.state.lock();
        Ok(state
            .collections
            .iter()
            .find(|c| c.meta.name == name)
            .map(|c| c.meta.clone()))
    }

    fn create_collection(
        &self,
        name: &str,
        metadata: Map<String, Value>,
    ) -> NativeResult<ChromaCollection> {
        self.faults.check(Op::CreateCollection)?;
        let mut state = self.state.lock();
        if state.collections.iter().any(|c| c.meta.name == name) {
            return Err(NativeError::status(409, format!("Collection {} already exists", name)));
        }
        state.next_id += 1;
        let meta = ChromaCollection {
            id: format!("col-{}", state.next_id),
            name: name.to_string(),
            metadata: (!metadata.is_empty()).then_some(metadata),
        };
        state.collections.push(Collection {
            meta: meta.clone(),
            records: Vec::new(),
        });
        Ok(meta)
    }

    fn upsert(&self, collection_id: &str, records: &ChromaRecords) -> NativeResult<()> {
        self.faults.check(Op::Upsert)?;
        if let Some(max) = self.max_batch {
            if records.ids.len() > max {
                return Err(NativeError::status(
                    400,
                    format!("batch size {} exceeds maximum {}", records.ids.len(), max),
                ));
            }
        }
        let embeddings = records
            .embeddings
            .clone()
            .ok_or_else(|| NativeError::status(400, "embeddings are required"))?;
        let mut state = self.state.lock();
        let collection = state.by_id(collection_id)?;
        let dimension = collection
            .records
            .first()
            .map(|r| r.embedding.len())
            .or_else(|| embeddings.first().map(Vec::len));
        if embeddings.iter().any(|e| Some(e.len()) != dimension) {
            return Err(NativeError::status(400, "embedding dimension mismatch"));
        }

        let mut metadatas = records.metadatas.clone().unwrap_or_default().into_iter();
        let mut documents = records.documents.clone().unwrap_or_default().into_iter();
        for (id, embedding) in records.ids.iter().zip(embeddings) {
            let stored = Stored {
                id: id.clone(),
                embedding,
                metadata: metadatas.next().flatten(),
                document: documents.next().flatten(),
            };
            match collection.records.iter_mut().find(|r| &r.id == id) {
                Some(existing) => *existing = stored,
                None => collection.records.push(stored),
            }
        }
        Ok(())
    }

    fn query(
        &self,
        collection_id: &str,
        embedding: &[f32],
        n_results: usize,
        where_filter: Option<&Value>,
        include_embeddings: bool,
    ) -> NativeResult<ChromaHits> {
        self.faults.check(Op::Query)?;
        let mut state = self.state.lock();
        state.last_where = where_filter.cloned();
        let collection = state.by_id(collection_id)?;
        let space = collection.space();

        let mut scored: Vec<(usize, f32, &Stored)> = collection
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| where_filter.map_or(true, |w| matches(w, r.metadata.as_ref())))
            .map(|(i, r)| (i, distance(&space, embedding, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));
        scored.truncate(n_results);

        Ok(ChromaHits {
            ids: scored.iter().map(|(_, _, r)| r.id.clone()).collect(),
            distances: scored.iter().map(|(_, d, _)| *d).collect(),
            metadatas: scored.iter().map(|(_, _, r)| r.metadata.clone()).collect(),
            documents: scored.iter().map(|(_, _, r)| r.document.clone()).collect(),
            embeddings: include_embeddings
                .then(|| scored.iter().map(|(_, _, r)| r.embedding.clone()).collect()),
        })
    }

    fn get(
        &self,
        collection_id: &str,
        ids: Option<&[String]>,
        include_embeddings: bool,
    ) -> NativeResult<ChromaRecords> {
        self.faults.check(Op::Get)?;
        let mut state = self.state.lock();
        let collection = state.by_id(collection_id)?;
        let selected: Vec<&Stored> = collection
            .records
            .iter()
            .filter(|r| ids.map_or(true, |ids| ids.contains(&r.id)))
            .collect();
        Ok(ChromaRecords {
            ids: selected.iter().map(|r| r.id.clone()).collect(),
            embeddings: include_embeddings
                .then(|| selected.iter().map(|r| r.embedding.clone()).collect()),
            metadatas: Some(selected.iter().map(|r| r.metadata.clone()).collect()),
            documents: Some(selected.iter().map(|r| r.document.clone()).collect()),
        })
    }

    fn delete(&self, collection_id: &str, ids: &[String]) -> NativeResult<()> {
        self.faults.check(Op::Delete)?;
        let mut state = self.state.lock();
        let collection = state.by_id(collection_id)?;
        collection.records.retain(|r| !ids.contains(&r.id));
        Ok(())
    }

    fn count(&self, collection_id: &str) -> NativeResult<usize> {
        self.faults.check(Op::Count)?;
        let mut state = self.state.lock();
        Ok(state.by_id(collection_id)?.records.len())
    }
}
