//! Filter Tests
//!
//! Filters are conjunctive and exact on every backend; an operator a
//! backend cannot express fails instead of widening the result set.

use crate::*;
use dataclients_core::{Filter, Range, ValidationError};
use dataclients_vectorstore::testing::Op;
use dataclients_vectorstore::VectorError;

fn seed(s: &Subject) {
    s.upsert(
        "docs",
        &[
            VectorRecord::new("a", angle(0.0))
                .field("category", "x")
                .field("year", 2019)
                .field("rating", 0.5),
            VectorRecord::new("b", angle(10.0))
                .field("category", "y")
                .field("year", 2021)
                .field("rating", 0.9),
            VectorRecord::new("c", angle(20.0))
                .field("category", "x")
                .field("year", 2023),
            VectorRecord::new("d", angle(30.0)).field("year", 2020),
        ],
    )
    .unwrap();
}

fn filtered(s: &Subject, filter: Filter) -> Vec<String> {
    let request = SearchRequest::vector(angle(0.0), 10).with_filter(filter);
    let results = s
        .search("docs", &request)
        .unwrap_or_else(|e| panic!("[{}] filtered search failed: {}", s.kind.name(), e));
    result_ids(&results)
}

#[test]
fn test_equality() {
    test_across_backends(|s| {
        seed(s);
        let name = s.kind.name();
        assert_eq!(filtered(s, Filter::new().eq("category", "x")), ids(&["a", "c"]), "[{}]", name);
        assert_eq!(filtered(s, Filter::new().eq("year", 2021)), ids(&["b"]), "[{}]", name);
        assert_eq!(filtered(s, Filter::new().eq("rating", 0.5)), ids(&["a"]), "[{}]", name);
        assert!(filtered(s, Filter::new().eq("category", "z")).is_empty());
    });
}

#[test]
fn test_not_equal_requires_key() {
    test_across_backends(|s| {
        seed(s);
        // "d" has no category and is not a match
        assert_eq!(
            filtered(s, Filter::new().not_eq("category", "x")),
            ids(&["b"]),
            "[{}]",
            s.kind.name()
        );
    });
}

#[test]
fn test_range() {
    test_across_backends(|s| {
        seed(s);
        let name = s.kind.name();
        assert_eq!(
            filtered(s, Filter::new().range("year", Range::new().gte(2020.0).lt(2023.0))),
            ids(&["b", "d"]),
            "[{}]",
            name
        );
        assert_eq!(
            filtered(s, Filter::new().range("rating", Range::new().gt(0.6))),
            ids(&["b"]),
            "[{}]",
            name
        );
    });
}

#[test]
fn test_any_of() {
    test_across_backends(|s| {
        seed(s);
        assert_eq!(
            filtered(s, Filter::new().any_of("category", ["y", "z"])),
            ids(&["b"]),
            "[{}]",
            s.kind.name()
        );
        assert_eq!(
            filtered(s, Filter::new().any_of("year", [2019, 2023])),
            ids(&["a", "c"]),
            "[{}]",
            s.kind.name()
        );
    });
}

#[test]
fn test_conditions_are_conjunctive() {
    test_across_backends(|s| {
        seed(s);
        let filter = Filter::new()
            .eq("category", "x")
            .range("year", Range::new().gte(2020.0));
        assert_eq!(filtered(s, filter), ids(&["c"]), "[{}]", s.kind.name());
    });
}

#[test]
fn test_empty_filter_matches_all() {
    test_across_backends(|s| {
        seed(s);
        assert_eq!(filtered(s, Filter::new()).len(), 4, "[{}]", s.kind.name());
    });
}

#[test]
fn test_prefix_is_unsupported_everywhere() {
    test_across_backends(|s| {
        seed(s);
        let request =
            SearchRequest::vector(angle(0.0), 10).with_filter(Filter::new().prefix("category", "x"));
        let queries_before = s.faults().calls(Op::Query);
        let err = s.search("docs", &request).unwrap_err();
        assert!(
            matches!(
                err,
                VectorError::Validation(ValidationError::UnsupportedFilter { .. })
            ),
            "[{}] {:?}",
            s.kind.name(),
            err
        );
        assert_eq!(s.faults().calls(Op::Query), queries_before, "[{}]", s.kind.name());
    });
}

#[test]
fn test_float_any_of_unsupported_on_qdrant() {
    for kind in [Kind::Qdrant, Kind::QdrantAsync] {
        let s = Subject::new(kind);
        seed(&s);
        let request = SearchRequest::vector(angle(0.0), 10)
            .with_filter(Filter::new().any_of("rating", [0.5, 0.9]));
        let err = s.search("docs", &request).unwrap_err();
        assert!(
            matches!(
                err,
                VectorError::Validation(ValidationError::UnsupportedFilter { .. })
            ),
            "[{}] {:?}",
            kind.name(),
            err
        );
    }
}
