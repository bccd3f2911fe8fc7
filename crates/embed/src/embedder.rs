//! Embedder traits
//!
//! An embedder maps text to a fixed-length vector. Two traits cover the two
//! concurrency modes; an implementation may provide both.

use crate::error::{EmbeddingError, EmbeddingResult};
use async_trait::async_trait;

/// Blocking embedder
pub trait Embedder: Send + Sync {
    /// Embed one document text
    ///
    /// Empty or whitespace-only text fails with `EmptyInput`; a zero vector
    /// is never returned.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed a search query
    ///
    /// Providers with asymmetric retrieval embed queries differently from
    /// documents.
    fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed(text)
    }

    /// Embed many texts, preserving order
    ///
    /// Any failing element fails the whole batch. Empty input returns an
    /// empty output without a remote call.
    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Output dimensionality, when known up front
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Non-blocking embedder
#[async_trait]
pub trait AsyncEmbedder: Send + Sync {
    /// Embed one document text
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed a search query
    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed(text).await
    }

    /// Embed many texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Output dimensionality, when known up front
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Reject empty or whitespace-only text
pub fn check_text(text: &str) -> EmbeddingResult<()> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::EmptyInput(
            "text is empty or whitespace".to_string(),
        ));
    }
    Ok(())
}

/// Reject a batch holding any empty text
pub fn check_batch(texts: &[String]) -> EmbeddingResult<()> {
    match texts.iter().position(|t| t.trim().is_empty()) {
        Some(index) => Err(EmbeddingError::EmptyInput(format!(
            "text at index {} is empty or whitespace",
            index
        ))),
        None => Ok(()),
    }
}
