//! Batching Tests
//!
//! - writes split into sub-batches of the effective size
//! - a failed sub-batch reports exactly which ids were written

use crate::*;
use dataclients_core::ErrorKind;
use dataclients_vectorstore::testing::Op;
use dataclients_vectorstore::{NativeError, VectorError};

fn records(n: usize) -> Vec<VectorRecord> {
    (0..n)
        .map(|i| VectorRecord::new(format!("r{}", i), angle(i as f32 * 5.0)))
        .collect()
}

fn batched(kind: Kind, batch_size: usize, faults: FaultPlan) -> Subject {
    Subject::open(kind, store_config().with_batch_size(batch_size), faults).unwrap()
}

#[test]
fn test_writes_split_into_batches() {
    for kind in ALL_KINDS {
        let s = batched(kind, 2, FaultPlan::new());
        s.upsert("docs", &records(5)).unwrap();
        assert_eq!(s.faults().calls(Op::Upsert), 3, "[{}]", kind.name());
        assert_eq!(s.count("docs").unwrap(), 5);
    }
}

#[test]
fn test_failed_batch_reports_partial_write() {
    for kind in ALL_KINDS {
        let faults = FaultPlan::new();
        faults.fail_nth(Op::Upsert, 2, NativeError::status(500, "disk full"));
        let s = batched(kind, 2, faults);

        let err = s.upsert("docs", &records(5)).unwrap_err();
        match &err {
            VectorError::PartialUpsert {
                succeeded, pending, ..
            } => {
                assert_eq!(succeeded, &ids(&["r0", "r1"]), "[{}]", kind.name());
                assert_eq!(pending, &ids(&["r2", "r3", "r4"]), "[{}]", kind.name());
            }
            other => panic!("[{}] expected partial upsert, got {:?}", kind.name(), other),
        }
        assert_eq!(err.kind(), ErrorKind::BackendFault);
        assert_eq!(s.count("docs").unwrap(), 2, "[{}]", kind.name());

        // Retrying the pending records completes the write
        let rest: Vec<VectorRecord> = records(5).into_iter().skip(2).collect();
        s.upsert("docs", &rest).unwrap();
        assert_eq!(s.count("docs").unwrap(), 5);
    }
}

#[test]
fn test_first_batch_failure_is_not_partial() {
    for kind in ALL_KINDS {
        let faults = FaultPlan::new();
        faults.fail_nth(Op::Upsert, 1, NativeError::status(500, "boom"));
        let s = batched(kind, 2, faults);
        let err = s.upsert("docs", &records(4)).unwrap_err();
        assert!(
            matches!(err, VectorError::BackendFault { .. }),
            "[{}] {:?}",
            kind.name(),
            err
        );
        assert_eq!(s.count("docs").unwrap(), 0);
    }
}

#[test]
fn test_transient_batch_failure_retried_in_place() {
    for kind in ALL_KINDS {
        let faults = FaultPlan::new();
        faults.fail_nth(Op::Upsert, 2, NativeError::RateLimited("slow down".to_string()));
        let s = batched(kind, 2, faults);
        s.upsert("docs", &records(5)).unwrap();
        assert_eq!(s.faults().calls(Op::Upsert), 4, "[{}]", kind.name());
        assert_eq!(s.count("docs").unwrap(), 5);
    }
}

#[test]
fn test_chroma_batch_capped_by_server_maximum() {
    let chroma = MemoryChroma::new().with_max_batch_size(3);
    let store = ChromaStore::with_api(store_config(), Arc::new(chroma.clone()), None).unwrap();
    store.upsert("docs", &records(7)).unwrap();
    assert_eq!(chroma.faults().calls(Op::Upsert), 3);
    assert_eq!(store.count("docs").unwrap(), 7);
}

#[test]
fn test_large_write_uses_backend_default() {
    // 100 per batch on the server backends, 5000 on the embedded one
    let expected = [(Kind::Chroma, 1), (Kind::Qdrant, 3), (Kind::QdrantAsync, 3)];
    for (kind, calls) in expected {
        let s = Subject::new(kind);
        s.upsert("docs", &records(250)).unwrap();
        assert_eq!(s.faults().calls(Op::Upsert), calls, "[{}]", kind.name());
        assert_eq!(s.count("docs").unwrap(), 250);
    }
}
