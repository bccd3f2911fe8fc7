//! Search Tests
//!
//! - ordering and deterministic tie-break
//! - score normalization per metric, identical across backends
//! - sync/async parity
//! - n_results clamping

use crate::*;
use dataclients_core::{ErrorKind, Query, ValidationError};
use dataclients_vectorstore::VectorError;
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[test]
fn test_results_ordered_by_score() {
    test_across_backends(|s| {
        let records: Vec<VectorRecord> = [0.0f32, 60.0, 30.0, 90.0, 10.0]
            .iter()
            .enumerate()
            .map(|(i, deg)| VectorRecord::new(format!("r{}", i), angle(*deg)))
            .collect();
        s.upsert("docs", &records).unwrap();

        let results = s.query("docs", &angle(0.0), 5);
        assert_eq!(
            result_ids(&results),
            ids(&["r0", "r4", "r2", "r1", "r3"]),
            "[{}]",
            s.kind.name()
        );
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    });
}

#[test]
fn test_ties_break_by_ascending_id() {
    test_across_backends(|s| {
        // Inserted out of order; engines hand ties back in insertion order reversed
        let records: Vec<VectorRecord> = ["m", "c", "x", "a", "k"]
            .iter()
            .map(|id| VectorRecord::new(*id, axis(2, 0)))
            .collect();
        s.upsert("docs", &records).unwrap();
        s.upsert("docs", &[VectorRecord::new("far", axis(2, 1))]).unwrap();

        let all = s.query("docs", &axis(2, 0), 6);
        assert_eq!(
            result_ids(&all),
            ids(&["a", "c", "k", "m", "x", "far"]),
            "[{}]",
            s.kind.name()
        );

        let top = s.query("docs", &axis(2, 0), 2);
        assert_eq!(result_ids(&top), ids(&["a", "c"]), "[{}]", s.kind.name());
    });
}

#[test]
fn test_tie_group_larger_than_fetch_window() {
    test_across_backends(|s| {
        let name = s.kind.name();
        let tied: Vec<VectorRecord> = (0..40)
            .map(|i| VectorRecord::new(format!("r{:02}", i), axis(2, 0)))
            .collect();
        s.upsert("docs", &tied).unwrap();

        assert_eq!(result_ids(&s.query("docs", &axis(2, 0), 1)), ids(&["r00"]), "[{}]", name);
        assert_eq!(
            result_ids(&s.query("docs", &axis(2, 0), 3)),
            ids(&["r00", "r01", "r02"]),
            "[{}]",
            name
        );
    });
}

#[test]
fn test_tie_group_below_a_distinct_leader() {
    test_across_backends(|s| {
        let mut records: Vec<VectorRecord> = (0..30)
            .map(|i| VectorRecord::new(format!("t{:02}", i), angle(45.0)))
            .collect();
        records.push(VectorRecord::new("zz-best", angle(0.0)));
        records.push(VectorRecord::new("a-far", angle(90.0)));
        s.upsert("docs", &records).unwrap();

        assert_eq!(
            result_ids(&s.query("docs", &angle(0.0), 2)),
            ids(&["zz-best", "t00"]),
            "[{}]",
            s.kind.name()
        );
    });
}

#[test]
fn test_fewer_records_than_requested() {
    test_across_backends(|s| {
        s.upsert(
            "docs",
            &[
                VectorRecord::new("a", axis(4, 0)),
                VectorRecord::new("b", axis(4, 1)),
            ],
        )
        .unwrap();
        assert_eq!(s.query("docs", &axis(4, 0), 10).len(), 2, "[{}]", s.kind.name());
    });
}

fn scores_for(metric: DistanceMetric) -> Vec<(Kind, Vec<(String, f32)>)> {
    ALL_KINDS
        .iter()
        .map(|&kind| {
            let s = Subject::open(kind, config_with(None, metric), FaultPlan::new()).unwrap();
            s.upsert(
                "docs",
                &[
                    VectorRecord::new("a", vec![1.0, 0.0]),
                    VectorRecord::new("b", vec![0.6, 0.8]),
                    VectorRecord::new("c", vec![0.0, 1.0]),
                ],
            )
            .unwrap();
            let hits = s.query("docs", &[1.0, 0.0], 3);
            (kind, hits.into_iter().map(|h| (h.id, h.score)).collect())
        })
        .collect()
}

fn assert_scores(metric: DistanceMetric, expected: &[(&str, f32)]) {
    for (kind, hits) in scores_for(metric) {
        assert_eq!(hits.len(), expected.len(), "[{}] {}", kind.name(), metric);
        for ((id, score), (want_id, want_score)) in hits.iter().zip(expected) {
            assert_eq!(id, want_id, "[{}] {}", kind.name(), metric);
            assert_close(*score, *want_score, &format!("[{}] {} {}", kind.name(), metric, id));
        }
    }
}

#[test]
fn test_cosine_scores() {
    assert_scores(
        DistanceMetric::Cosine,
        &[("a", 1.0), ("b", 0.6), ("c", 0.0)],
    );
}

#[test]
fn test_dot_product_scores() {
    assert_scores(
        DistanceMetric::DotProduct,
        &[("a", 1.0), ("b", 0.6), ("c", 0.0)],
    );
}

#[test]
fn test_euclidean_scores() {
    // |a-q| = 0, |b-q| = sqrt(0.16 + 0.64), |c-q| = sqrt(2)
    let b = 1.0 / (1.0 + 0.8f32.sqrt());
    let c = 1.0 / (1.0 + 2.0f32.sqrt());
    assert_scores(DistanceMetric::Euclidean, &[("a", 1.0), ("b", b), ("c", c)]);
}

/// Identical inputs give identical result lists from every adapter
#[test]
fn test_backend_parity() {
    let outcomes = collect_across_backends(|s| {
        let records: Vec<VectorRecord> = (0..12)
            .map(|i| {
                VectorRecord::new(format!("r{:02}", i), angle((i * 15) as f32 % 90.0))
                    .field("group", (i % 3) as i64)
            })
            .collect();
        s.upsert("docs", &records).unwrap();
        let plain = s.query("docs", &angle(20.0), 6);
        let filtered = s
            .search(
                "docs",
                &SearchRequest::vector(angle(20.0), 6)
                    .with_filter(dataclients_core::Filter::new().eq("group", 1)),
            )
            .unwrap();
        (plain, filtered)
    });

    let (_, (base_plain, base_filtered)) = &outcomes[0];
    for (kind, (plain, filtered)) in &outcomes[1..] {
        assert_eq!(result_ids(plain), result_ids(base_plain), "[{}]", kind.name());
        assert_eq!(result_ids(filtered), result_ids(base_filtered), "[{}]", kind.name());
        for (a, b) in plain.iter().zip(base_plain) {
            assert_close(a.score, b.score, kind.name());
        }
    }
}

#[test]
fn test_sync_async_parity() {
    let run = |kind: Kind| {
        let s = Subject::new(kind);
        let records: Vec<VectorRecord> = (0..20)
            .map(|i| VectorRecord::new(format!("p{}", i), angle((i * 7) as f32 % 80.0)))
            .collect();
        s.upsert("docs", &records).unwrap();
        s.query("docs", &angle(33.0), 8)
    };
    assert_eq!(run(Kind::Qdrant), run(Kind::QdrantAsync));
}

#[test]
fn test_with_vectors_flag() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        let bare = s.query("docs", &axis(2, 0), 1);
        assert!(bare[0].vector.is_none(), "[{}]", s.kind.name());
        let full = s
            .search("docs", &SearchRequest::vector(axis(2, 0), 1).with_vectors(true))
            .unwrap();
        assert_eq!(full[0].vector.as_deref(), Some(&axis(2, 0)[..]), "[{}]", s.kind.name());
    });
}

#[test]
fn test_invalid_requests() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();

        let err = s.search("docs", &SearchRequest::vector(axis(2, 0), 0)).unwrap_err();
        assert!(
            matches!(err, VectorError::Validation(ValidationError::InvalidNResults(0))),
            "[{}] {:?}",
            s.kind.name(),
            err
        );

        let err = s.search("docs", &SearchRequest::vector(axis(3, 0), 1)).unwrap_err();
        assert!(matches!(
            err,
            VectorError::Validation(ValidationError::DimensionMismatch { expected: 2, got: 3 })
        ));

        let text = SearchRequest {
            query: Query::Text("hello".to_string()),
            n_results: 1,
            filter: None,
            with_vectors: false,
        };
        let err = s.search("docs", &text).unwrap_err();
        assert!(matches!(
            err,
            VectorError::Validation(ValidationError::MissingEmbedder)
        ));

        let err = s.search("bad name!", &SearchRequest::vector(axis(2, 0), 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    });
}

// =============================================================================
// Clamp warning capture
// =============================================================================

#[derive(Default)]
struct WarningStore(Mutex<Vec<String>>);

struct WarningLayer(Arc<WarningStore>);

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for WarningLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.0 .0.lock().unwrap().push(message);
        }
    }
}

#[test]
fn test_oversized_n_results_clamped_with_warning() {
    for kind in ALL_KINDS {
        let store = Arc::new(WarningStore::default());
        let subscriber = tracing_subscriber::registry().with(WarningLayer(Arc::clone(&store)));

        let s = Subject::open(kind, store_config().with_max_n_results(3), FaultPlan::new()).unwrap();
        let records: Vec<VectorRecord> = (0..6)
            .map(|i| VectorRecord::new(format!("r{}", i), angle(i as f32 * 10.0)))
            .collect();
        s.upsert("docs", &records).unwrap();

        let results = tracing::subscriber::with_default(subscriber, || {
            s.query("docs", &angle(0.0), 50)
        });
        assert_eq!(result_ids(&results), ids(&["r0", "r1", "r2"]), "[{}]", kind.name());

        let warnings = store.0.lock().unwrap();
        assert!(
            warnings.iter().any(|m| m.contains("clamping")),
            "[{}] no clamp warning in {:?}",
            kind.name(),
            *warnings
        );
    }
}
