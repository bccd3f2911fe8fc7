//! Ollama local inference
//!
//! The embeddings endpoint takes one prompt per call.

use crate::error::{EmbeddingError, EmbeddingResult};
use serde::Deserialize;
use serde_json::json;

pub(super) const DEFAULT_MODEL: &str = "nomic-embed-text";
pub(super) const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub(super) fn request_body(model: &str, texts: &[String]) -> serde_json::Value {
    let prompt = texts.first().map(String::as_str).unwrap_or_default();
    json!({ "model": model, "prompt": prompt })
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

pub(super) fn parse_response(body: serde_json::Value) -> EmbeddingResult<Vec<Vec<f32>>> {
    let response: EmbeddingResponse = serde_json::from_value(body)
        .map_err(|e| EmbeddingError::malformed("ollama", e.to_string()))?;
    if response.embedding.is_empty() {
        return Err(EmbeddingError::malformed("ollama", "empty embedding"));
    }
    Ok(vec![response.embedding])
}
