//! Basic Operation Tests
//!
//! - upsert / get / count / delete round trips
//! - idempotent upsert and delete
//! - missing collections

use crate::*;
use dataclients_core::{ErrorKind, PayloadValue};

/// Two records into a 2-dimensional collection, queried by vector
#[test]
fn test_two_record_scenario() {
    test_across_backends(|s| {
        let name = s.kind.name();
        s.upsert(
            "docs",
            &[
                VectorRecord::new("a", vec![1.0, 0.0]).field("cat", "x"),
                VectorRecord::new("b", vec![0.0, 1.0]).field("cat", "y"),
            ],
        )
        .unwrap();

        let top = s.query("docs", &[1.0, 0.0], 1);
        assert_eq!(result_ids(&top), ids(&["a"]), "[{}]", name);
        assert_close(top[0].score, 1.0, name);

        let request = SearchRequest::vector(vec![1.0, 0.0], 5)
            .with_filter(dataclients_core::Filter::new().eq("cat", "y"));
        let filtered = s.search("docs", &request).unwrap();
        assert_eq!(result_ids(&filtered), ids(&["b"]), "[{}]", name);
        assert_close(filtered[0].score, 0.0, name);
    });
}

#[test]
fn test_get_is_positional() {
    test_across_backends(|s| {
        s.upsert(
            "docs",
            &[
                VectorRecord::new("a", axis(3, 0)).field("n", 1).with_text("alpha"),
                VectorRecord::new("b", axis(3, 1)),
            ],
        )
        .unwrap();

        let got = s.get("docs", &ids(&["b", "missing", "a"])).unwrap();
        assert_eq!(got.len(), 3, "[{}]", s.kind.name());
        assert_eq!(got[0].as_ref().unwrap().id, "b");
        assert!(got[1].is_none());
        let a = got[2].as_ref().unwrap();
        assert_eq!(a.vector, axis(3, 0));
        assert_eq!(a.payload.get("n"), Some(&PayloadValue::Int(1)));
        assert_eq!(a.text.as_deref(), Some("alpha"));
    });
}

#[test]
fn test_upsert_is_idempotent() {
    test_across_backends(|s| {
        let record = VectorRecord::new("a", axis(2, 0)).field("cat", "x");
        s.upsert("docs", &[record.clone()]).unwrap();
        let first = s.get("docs", &ids(&["a"])).unwrap();
        s.upsert("docs", &[record]).unwrap();
        let second = s.get("docs", &ids(&["a"])).unwrap();

        assert_eq!(first, second, "[{}]", s.kind.name());
        assert_eq!(s.count("docs").unwrap(), 1);
    });
}

#[test]
fn test_upsert_replaces_whole_record() {
    test_across_backends(|s| {
        s.upsert(
            "docs",
            &[VectorRecord::new("a", axis(2, 0)).field("old", true).with_text("v1")],
        )
        .unwrap();
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 1)).field("new", true)])
            .unwrap();

        let got = s.get("docs", &ids(&["a"])).unwrap().remove(0).unwrap();
        assert_eq!(got.vector, axis(2, 1), "[{}]", s.kind.name());
        assert!(got.payload.get("old").is_none());
        assert!(got.payload.contains_key("new"));
        assert!(got.text.is_none());
        assert_eq!(s.count("docs").unwrap(), 1);
    });
}

#[test]
fn test_delete_is_idempotent() {
    test_across_backends(|s| {
        s.upsert(
            "docs",
            &[
                VectorRecord::new("a", axis(2, 0)),
                VectorRecord::new("b", axis(2, 1)),
            ],
        )
        .unwrap();

        s.delete("docs", &ids(&["a", "ghost"])).unwrap();
        s.delete("docs", &ids(&["a", "ghost"])).unwrap();
        assert_eq!(s.count("docs").unwrap(), 1, "[{}]", s.kind.name());
        assert!(s.get("docs", &ids(&["a"])).unwrap()[0].is_none());
        assert!(s.get("docs", &ids(&["b"])).unwrap()[0].is_some());
    });
}

#[test]
fn test_missing_collection_is_empty() {
    test_across_backends(|s| {
        let name = s.kind.name();
        assert_eq!(s.count("nowhere").unwrap(), 0, "[{}]", name);
        assert!(s.query("nowhere", &[1.0, 0.0], 3).is_empty());
        assert_eq!(s.get("nowhere", &ids(&["a"])).unwrap(), vec![None]);
        s.delete("nowhere", &ids(&["a"])).unwrap();
    });
}

#[test]
fn test_empty_upsert_writes_nothing() {
    test_across_backends(|s| {
        s.upsert("docs", &[]).unwrap();
        assert_eq!(s.count("docs").unwrap(), 0, "[{}]", s.kind.name());
    });
}

#[test]
fn test_collections_are_isolated() {
    test_across_backends(|s| {
        s.upsert("one", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        s.upsert("two", &[VectorRecord::new("a", axis(3, 1))]).unwrap();
        assert_eq!(s.count("one").unwrap(), 1);
        assert_eq!(s.count("two").unwrap(), 1);
        s.delete("one", &ids(&["a"])).unwrap();
        assert_eq!(s.count("one").unwrap(), 0, "[{}]", s.kind.name());
        assert_eq!(s.count("two").unwrap(), 1);
    });
}

#[test]
fn test_closed_store_is_backend_fault() {
    test_across_backends(|s| {
        s.upsert("docs", &[VectorRecord::new("a", axis(2, 0))]).unwrap();
        s.close().unwrap();
        let err = s.count("docs").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendFault, "[{}]", s.kind.name());
        assert!(s.upsert("docs", &[VectorRecord::new("b", axis(2, 1))]).is_err());
    });
}
