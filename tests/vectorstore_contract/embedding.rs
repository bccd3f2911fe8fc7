//! Text Query Tests
//!
//! Text queries go through the adapter's embedder, using the query
//! embedding rather than the document one.

use crate::*;
use async_trait::async_trait;
use dataclients_embed::EmbeddingResult;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Documents embed along the second axis, queries along the first
#[derive(Default)]
struct AsymmetricEmbedder {
    documents: AtomicUsize,
    queries: AtomicUsize,
}

impl AsymmetricEmbedder {
    fn document(&self) -> Vec<f32> {
        self.documents.fetch_add(1, Ordering::SeqCst);
        axis(2, 1)
    }

    fn query(&self) -> Vec<f32> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        axis(2, 0)
    }
}

impl Embedder for AsymmetricEmbedder {
    fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.document())
    }

    fn embed_query(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.query())
    }

    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.document()).collect())
    }
}

#[async_trait]
impl AsyncEmbedder for AsymmetricEmbedder {
    async fn embed(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.document())
    }

    async fn embed_query(&self, _text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.query())
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.document()).collect())
    }
}

fn text_search(kind: Kind) -> (Vec<SearchResult>, Arc<AsymmetricEmbedder>) {
    let embedder = Arc::new(AsymmetricEmbedder::default());
    let s = Subject::with_embedders(kind, Embedders::both(embedder.clone())).unwrap();
    s.upsert(
        "docs",
        &[
            VectorRecord::new("along-x", axis(2, 0)).field("lang", "en"),
            VectorRecord::new("along-y", axis(2, 1)).field("lang", "en"),
        ],
    )
    .unwrap();
    let results = s
        .search("docs", &SearchRequest::text("which way", 2))
        .unwrap_or_else(|e| panic!("[{}] text search failed: {}", kind.name(), e));
    (results, embedder)
}

#[test]
fn test_text_query_uses_query_embedding() {
    for kind in ALL_KINDS {
        let (results, embedder) = text_search(kind);
        assert_eq!(
            result_ids(&results),
            ids(&["along-x", "along-y"]),
            "[{}]",
            kind.name()
        );
        assert_close(results[0].score, 1.0, kind.name());
        assert_eq!(embedder.queries.load(Ordering::SeqCst), 1, "[{}]", kind.name());
        assert_eq!(embedder.documents.load(Ordering::SeqCst), 0, "[{}]", kind.name());
    }
}

#[test]
fn test_text_query_sync_async_parity() {
    let (blocking, _) = text_search(Kind::Qdrant);
    let (nonblocking, _) = text_search(Kind::QdrantAsync);
    assert_eq!(blocking, nonblocking);
}

#[test]
fn test_filtered_text_query() {
    for kind in ALL_KINDS {
        let embedder = Arc::new(AsymmetricEmbedder::default());
        let s = Subject::with_embedders(kind, Embedders::both(embedder)).unwrap();
        s.upsert(
            "docs",
            &[
                VectorRecord::new("along-x", axis(2, 0)).field("lang", "en"),
                VectorRecord::new("along-y", axis(2, 1)).field("lang", "de"),
            ],
        )
        .unwrap();
        let request = SearchRequest::text("which way", 5)
            .with_filter(dataclients_core::Filter::new().eq("lang", "de"));
        let results = s.search("docs", &request).unwrap();
        assert_eq!(result_ids(&results), ids(&["along-y"]), "[{}]", kind.name());
        assert_close(results[0].score, 0.0, kind.name());
    }
}
