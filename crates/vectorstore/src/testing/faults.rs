//! Scripted failures for in-memory backends

use crate::native::{NativeError, NativeResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Native operation, for counting calls and scripting failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Heartbeat / health probe
    Health,
    /// Collection lookup
    GetCollection,
    /// Collection creation
    CreateCollection,
    /// Record write
    Upsert,
    /// Similarity query
    Query,
    /// Fetch by id
    Get,
    /// Delete by id
    Delete,
    /// Record count
    Count,
}

#[derive(Debug, Default)]
struct Faults {
    calls: HashMap<Op, usize>,
    next: HashMap<Op, VecDeque<NativeError>>,
    nth: HashMap<(Op, usize), NativeError>,
    unreachable: bool,
}

/// Shared failure script
///
/// Clones share state, so a test can keep one while a backend owns another.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    inner: Arc<Mutex<Faults>>,
}

impl FaultPlan {
    /// No scripted failures
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `op` with `err`
    pub fn fail_next(&self, op: Op, err: NativeError, times: usize) {
        let mut faults = self.inner.lock();
        let queue = faults.next.entry(op).or_default();
        queue.extend(std::iter::repeat(err).take(times));
    }

    /// Fail the `n`th call (1-based, counted from creation) of `op`
    pub fn fail_nth(&self, op: Op, n: usize, err: NativeError) {
        self.inner.lock().nth.insert((op, n), err);
    }

    /// Refuse every connection while set
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unreachable = unreachable;
    }

    /// Calls of `op` so far, failed ones included
    pub fn calls(&self, op: Op) -> usize {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Record a call and return its scripted failure, if any
    pub fn check(&self, op: Op) -> NativeResult<()> {
        let mut faults = self.inner.lock();
        let count = {
            let calls = faults.calls.entry(op).or_insert(0);
            *calls += 1;
            *calls
        };
        if faults.unreachable {
            return Err(NativeError::Connect("connection refused".to_string()));
        }
        if let Some(err) = faults.nth.remove(&(op, count)) {
            return Err(err);
        }
        if let Some(err) = faults.next.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        Ok(())
    }
}
