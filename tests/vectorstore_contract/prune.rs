//! Retention Pruning Tests (embedded-local only)

use crate::*;
use chrono::NaiveDate;
use dataclients_vectorstore::testing::Op;
use dataclients_vectorstore::{RetentionPolicy, RetentionTier};

fn dated(id: &str, date: &str) -> VectorRecord {
    VectorRecord::new(id, axis(2, 0)).field("date", date)
}

fn store_with(records: &[VectorRecord]) -> (MemoryChroma, ChromaStore) {
    let chroma = MemoryChroma::new();
    let store = ChromaStore::with_api(store_config(), Arc::new(chroma.clone()), None).unwrap();
    store.upsert("notes", records).unwrap();
    (chroma, store)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn remaining(store: &ChromaStore, list: &[&str]) -> Vec<String> {
    store
        .get("notes", &ids(list))
        .unwrap()
        .into_iter()
        .flatten()
        .map(|r| r.id)
        .collect()
}

#[test]
fn test_default_tiers() {
    let (_, store) = store_with(&[
        // 200 days old
        dated("heavy-old", "2023-12-13").field("search_weight", 0.9),
        dated("mid-old", "2023-12-13").field("search_weight", 0.5),
        // 60 days old
        dated("mid-recent", "2024-05-01T08:00:00Z").field("search_weight", 0.5),
        dated("light-recent", "2024-05-01").field("search_weight", 0.1),
        dated("unweighted-new", "2024-06-20"),
        VectorRecord::new("undated", axis(2, 1)),
        dated("garbled", "yesterday"),
    ]);

    let deleted = store
        .prune_at("notes", &RetentionPolicy::default(), today())
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(
        remaining(
            &store,
            &[
                "heavy-old",
                "mid-old",
                "mid-recent",
                "light-recent",
                "unweighted-new",
                "undated",
                "garbled"
            ]
        ),
        ids(&["heavy-old", "mid-recent", "unweighted-new", "undated", "garbled"])
    );
}

#[test]
fn test_override_only_shortens() {
    let (_, store) = store_with(&[
        dated("short", "2024-06-20")
            .field("search_weight", 0.9)
            .field("retention_days", 5),
        dated("long", "2024-05-01")
            .field("search_weight", 0.1)
            .field("retention_days", 400),
    ]);
    let deleted = store
        .prune_at("notes", &RetentionPolicy::default(), today())
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.count("notes").unwrap(), 0);
}

#[test]
fn test_custom_policy() {
    let policy = RetentionPolicy::new(
        vec![RetentionTier {
            min_weight: 0.0,
            days: 7,
        }],
        7,
    );
    let (_, store) = store_with(&[
        dated("week-old", "2024-06-22"),
        dated("fresh", "2024-06-29"),
        dated("boundary", "2024-06-23"),
    ]);
    assert_eq!(store.prune_at("notes", &policy, today()).unwrap(), 1);
    assert_eq!(
        remaining(&store, &["week-old", "fresh", "boundary"]),
        ids(&["fresh", "boundary"])
    );
}

#[test]
fn test_nothing_expired_issues_no_delete() {
    let (chroma, store) = store_with(&[dated("new", "2024-06-29")]);
    assert_eq!(
        store
            .prune_at("notes", &RetentionPolicy::default(), today())
            .unwrap(),
        0
    );
    assert_eq!(chroma.faults().calls(Op::Delete), 0);
    assert_eq!(
        store
            .prune_at("absent", &RetentionPolicy::default(), today())
            .unwrap(),
        0
    );
}
