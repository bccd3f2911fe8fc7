//! OpenAI embeddings API

use crate::error::{EmbeddingError, EmbeddingResult};
use serde::Deserialize;
use serde_json::json;

pub(super) const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub(super) const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub(super) const MAX_BATCH: usize = 100;

pub(super) fn request_body(model: &str, texts: &[String]) -> serde_json::Value {
    json!({ "model": model, "input": texts })
}

#[derive(Deserialize)]
struct IndexedEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct IndexedResponse {
    data: Vec<IndexedEmbedding>,
}

/// Read `{"data": [{"index", "embedding"}]}`, ordered by `index`
///
/// The API does not promise response order, so items are sorted before
/// being returned.
pub(super) fn parse_indexed(
    provider: &'static str,
    body: serde_json::Value,
) -> EmbeddingResult<Vec<Vec<f32>>> {
    let mut response: IndexedResponse = serde_json::from_value(body)
        .map_err(|e| EmbeddingError::malformed(provider, e.to_string()))?;
    response.data.sort_by_key(|item| item.index);
    for (position, item) in response.data.iter().enumerate() {
        if item.index != position {
            return Err(EmbeddingError::malformed(
                provider,
                format!("missing embedding for index {}", position),
            ));
        }
    }
    Ok(response.data.into_iter().map(|item| item.embedding).collect())
}
