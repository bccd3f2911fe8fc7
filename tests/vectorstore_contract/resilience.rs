//! Resilience Tests
//!
//! - transient failures retried up to the configured ceiling
//! - faults and validation errors never retried
//! - unreachable servers and configuration conflicts

use crate::*;
use dataclients_core::{ErrorKind, TransientKind, ValidationError};
use dataclients_vectorstore::testing::Op;
use dataclients_vectorstore::{NativeError, VectorError};

fn seeded(kind: Kind, faults: FaultPlan) -> Subject {
    let s = Subject::open(kind, store_config(), faults).unwrap();
    s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
    s
}

#[test]
fn test_transient_failure_recovers_within_ceiling() {
    for kind in ALL_KINDS {
        let s = seeded(kind, FaultPlan::new());
        s.faults()
            .fail_next(Op::Query, NativeError::Timeout("slow".to_string()), 2);
        let before = s.faults().calls(Op::Query);
        let hits = s.query("docs", &axis(2, 0), 1);
        assert_eq!(result_ids(&hits), ids(&["a"]), "[{}]", kind.name());
        assert_eq!(s.faults().calls(Op::Query) - before, 3);
    }
}

#[test]
fn test_retry_ceiling_reports_attempts() {
    for kind in ALL_KINDS {
        let s = seeded(kind, FaultPlan::new());
        s.faults().fail_next(
            Op::Upsert,
            NativeError::RateLimited("quota".to_string()),
            10,
        );
        let before = s.faults().calls(Op::Upsert);

        let err = s
            .upsert("docs", &[VectorRecord::new("b", axis(2, 1))])
            .unwrap_err();
        match err {
            VectorError::Transient { kind: cause, attempts, .. } => {
                assert_eq!(cause, TransientKind::RateLimited, "[{}]", kind.name());
                assert_eq!(attempts, 3, "[{}]", kind.name());
            }
            other => panic!("[{}] expected transient, got {:?}", kind.name(), other),
        }
        assert_eq!(s.faults().calls(Op::Upsert) - before, 3, "[{}]", kind.name());
    }
}

#[test]
fn test_backend_fault_not_retried() {
    for kind in ALL_KINDS {
        let s = seeded(kind, FaultPlan::new());
        s.faults()
            .fail_next(Op::Count, NativeError::status(500, "internal"), 5);
        let before = s.faults().calls(Op::Count);
        let err = s.count("docs").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendFault, "[{}]", kind.name());
        assert!(!err.is_retryable());
        assert_eq!(s.faults().calls(Op::Count) - before, 1, "[{}]", kind.name());
    }
}

#[test]
fn test_lost_connection_is_transient() {
    for kind in ALL_KINDS {
        let s = seeded(kind, FaultPlan::new());
        s.faults().set_unreachable(true);
        let err = s.count("docs").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient, "[{}]", kind.name());
        assert!(err.is_retryable());

        s.faults().set_unreachable(false);
        assert_eq!(s.count("docs").unwrap(), 1, "[{}]", kind.name());
    }
}

#[test]
fn test_unreachable_at_open_is_backend_fault() {
    for kind in ALL_KINDS {
        let faults = FaultPlan::new();
        faults.set_unreachable(true);
        // Blocking adapters connect on first use, the async one on open
        let err = Subject::open(kind, store_config(), faults)
            .and_then(|s| s.count("docs"))
            .err()
            .unwrap_or_else(|| panic!("[{}] expected failure", kind.name()));
        assert_eq!(err.kind(), ErrorKind::BackendFault, "[{}]", kind.name());
    }
}

#[test]
fn test_reopen_with_other_dimension_conflicts() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(3, 0))]).unwrap();

        let other = s
            .reopen(config_with(Some(4), DistanceMetric::Cosine))
            .unwrap();
        let err = other
            .upsert("docs", &[VectorRecord::new("b", axis(4, 0))])
            .unwrap_err();
        match &err {
            VectorError::ConfigConflict { collection, .. } => assert_eq!(collection, "docs"),
            other => panic!("[{}] expected conflict, got {:?}", s.kind.name(), other),
        }
        assert!(err.kind() == ErrorKind::ConfigConflict && !err.is_retryable());
        assert_eq!(s.count("docs").unwrap(), 1, "[{}]", s.kind.name());
    });
}

#[test]
fn test_reopen_with_other_metric_conflicts() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(3, 0))]).unwrap();
        let other = s
            .reopen(config_with(None, DistanceMetric::Euclidean))
            .unwrap();
        let err = other
            .search("docs", &SearchRequest::vector(axis(3, 0), 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigConflict, "[{}]", s.kind.name());
    });
}

#[test]
fn test_reopen_with_matching_config_sees_data() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(3, 0))]).unwrap();
        let other = s
            .reopen(config_with(Some(3), DistanceMetric::Cosine))
            .unwrap();
        assert_eq!(other.count("docs").unwrap(), 1, "[{}]", s.kind.name());
        assert_eq!(result_ids(&other.query("docs", &axis(3, 0), 1)), ids(&["a"]));
    });
}

#[test]
fn test_collection_created_by_another_client() {
    test_across_backends(|s| {
        let other = s.reopen(store_config()).unwrap();
        other.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        s.upsert("docs", &[VectorRecord::new("b", axis(2, 1))]).unwrap();
        assert_eq!(s.count("docs").unwrap(), 2, "[{}]", s.kind.name());
    });
}

// =============================================================================
// Collections changed behind the adapter
// =============================================================================

#[test]
fn test_dropped_collection_seen_as_absent() {
    test_across_backends(|s| {
        let name = s.kind.name();
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        assert_eq!(s.count("docs").unwrap(), 1);
        assert!(s.drop_collection("docs"));

        assert_eq!(s.count("docs").unwrap(), 0, "[{}]", name);
        assert!(s.get("docs", &ids(&["a"])).unwrap()[0].is_none(), "[{}]", name);
        assert!(s.query("docs", &axis(2, 0), 1).is_empty(), "[{}]", name);

        s.upsert("docs", &[VectorRecord::new("b", axis(2, 1))]).unwrap();
        assert_eq!(s.count("docs").unwrap(), 1, "[{}]", name);
    });
}

#[test]
fn test_recreated_with_other_dimension() {
    test_across_backends(|s| {
        let name = s.kind.name();
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        assert_eq!(s.query("docs", &axis(2, 0), 1).len(), 1);

        s.drop_collection("docs");
        let other = s.reopen(store_config()).unwrap();
        other.upsert("docs", &[VectorRecord::new("n", axis(3, 0))]).unwrap();

        let err = s
            .upsert("docs", &[VectorRecord::new("b", axis(2, 1))])
            .unwrap_err();
        assert!(
            matches!(
                err,
                VectorError::Validation(ValidationError::DimensionMismatch { expected: 3, got: 2 })
            ),
            "[{}] {:?}",
            name,
            err
        );
        assert_eq!(result_ids(&s.query("docs", &axis(3, 0), 1)), ids(&["n"]), "[{}]", name);
    });
}

#[test]
fn test_recreated_with_other_metric_conflicts() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        assert_eq!(s.count("docs").unwrap(), 1);

        s.drop_collection("docs");
        let other = s
            .reopen(config_with(None, DistanceMetric::Euclidean))
            .unwrap();
        other.upsert("docs", &[VectorRecord::new("e", axis(2, 0))]).unwrap();

        let err = s
            .search("docs", &SearchRequest::vector(axis(2, 0), 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigConflict, "[{}]", s.kind.name());
        assert_eq!(s.count("docs").unwrap_err().kind(), ErrorKind::ConfigConflict);
    });
}
