//! Invariant Tests
//!
//! - one dimensionality per collection, rejected writes change nothing
//! - malformed records rejected before any write
//! - property tests for ordering and dimensionality

use crate::*;
use dataclients_core::{ErrorKind, ValidationError};
use dataclients_vectorstore::testing::Op;
use dataclients_vectorstore::VectorError;
use proptest::prelude::*;

fn snapshot(s: &Subject, list: &[&str]) -> (usize, Vec<Option<VectorRecord>>) {
    (s.count("docs").unwrap(), s.get("docs", &ids(list)).unwrap())
}

#[test]
fn test_dimension_mismatch_leaves_state_unchanged() {
    test_across_backends(|s| {
        let name = s.kind.name();
        s.upsert(
            "docs",
            &[
                VectorRecord::new("a", axis(3, 0)).field("v", 1),
                VectorRecord::new("b", axis(3, 1)),
            ],
        )
        .unwrap();
        let before = snapshot(s, &["a", "b", "c"]);
        let writes = s.faults().calls(Op::Upsert);

        // Wrong dimension for the collection
        let err = s
            .upsert("docs", &[VectorRecord::new("c", axis(4, 0))])
            .unwrap_err();
        assert!(
            matches!(
                err,
                VectorError::Validation(ValidationError::DimensionMismatch { expected: 3, got: 4 })
            ),
            "[{}] {:?}",
            name,
            err
        );

        // Mixed dimensions within one call, including an overwrite of "a"
        let err = s
            .upsert(
                "docs",
                &[
                    VectorRecord::new("a", axis(3, 2)).field("v", 2),
                    VectorRecord::new("c", axis(2, 0)),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "[{}]", name);

        assert_eq!(snapshot(s, &["a", "b", "c"]), before, "[{}]", name);
        assert_eq!(s.faults().calls(Op::Upsert), writes, "[{}] wrote before rejecting", name);
    });
}

#[test]
fn test_configured_dimension_enforced_on_first_write() {
    for kind in ALL_KINDS {
        let s = Subject::open(kind, config_with(Some(3), DistanceMetric::Cosine), FaultPlan::new())
            .unwrap();
        let err = s
            .upsert("docs", &[VectorRecord::new("a", axis(2, 0))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "[{}]", kind.name());
        assert_eq!(s.count("docs").unwrap(), 0);
        assert_eq!(s.faults().calls(Op::CreateCollection), 0, "[{}]", kind.name());
    }
}

#[test]
fn test_malformed_records_rejected() {
    test_across_backends(|s| {
        let name = s.kind.name();
        let cases: Vec<(Vec<VectorRecord>, &str)> = vec![
            (
                vec![
                    VectorRecord::new("a", axis(2, 0)),
                    VectorRecord::new("a", axis(2, 1)),
                ],
                "duplicate id",
            ),
            (vec![VectorRecord::new("", axis(2, 0))], "empty id"),
            (vec![VectorRecord::new("a", vec![])], "empty vector"),
            (vec![VectorRecord::new("a", vec![f32::NAN, 1.0])], "NaN component"),
            (
                vec![VectorRecord::new("a", axis(2, 0)).field("_id", "spoof")],
                "reserved payload key",
            ),
        ];
        for (records, what) in cases {
            let err = s.upsert("docs", &records).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "[{}] {}", name, what);
        }
        assert_eq!(s.faults().calls(Op::Upsert), 0, "[{}]", name);
        assert_eq!(s.count("docs").unwrap(), 0);
    });
}

#[test]
fn test_invalid_collection_names() {
    test_across_backends(|s| {
        for bad in ["", "-lead", "trail_", "has space", &"x".repeat(64)] {
            let err = s.upsert(bad, &[VectorRecord::new("a", axis(2, 0))]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "[{}] {:?}", s.kind.name(), bad);
        }
    });
}

// =============================================================================
// Properties
// =============================================================================

fn arb_points() -> impl Strategy<Value = Vec<(u8, u8)>> {
    // (id suffix, angle bucket); coarse buckets force ties
    proptest::collection::vec((0u8..40, 0u8..6), 1..25)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_results_sorted_with_id_tie_break(points in arb_points(), n in 1usize..12) {
        let mut records: Vec<VectorRecord> = Vec::new();
        for (id, bucket) in points {
            let id = format!("id{:02}", id);
            if records.iter().any(|r| r.id == id) {
                continue;
            }
            records.push(VectorRecord::new(id, angle(bucket as f32 * 15.0)));
        }
        for kind in ALL_KINDS {
            let s = Subject::new(kind);
            s.upsert("docs", &records).unwrap();
            let results = s.query("docs", &angle(0.0), n);
            prop_assert_eq!(results.len(), n.min(records.len()));
            for w in results.windows(2) {
                prop_assert!(
                    w[0].score > w[1].score || (w[0].score == w[1].score && w[0].id < w[1].id),
                    "[{}] {:?} before {:?}", kind.name(), w[0], w[1]
                );
            }
        }
    }

    #[test]
    fn prop_rejected_dimension_never_written(
        dim in 2usize..6,
        other in 2usize..6,
        count in 1usize..5,
    ) {
        prop_assume!(dim != other);
        for kind in ALL_KINDS {
            let s = Subject::new(kind);
            let seed: Vec<VectorRecord> =
                (0..count).map(|i| VectorRecord::new(format!("s{}", i), axis(dim, i))).collect();
            s.upsert("docs", &seed).unwrap();

            let bad = VectorRecord::new("bad", axis(other, 0));
            prop_assert!(s.upsert("docs", &[bad]).is_err());
            prop_assert_eq!(s.count("docs").unwrap(), count);
            prop_assert!(s.get("docs", &ids(&["bad"])).unwrap()[0].is_none());
        }
    }
}
