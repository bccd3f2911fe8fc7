//! Voyage AI embeddings API
//!
//! Same response shape as OpenAI; requests carry an `input_type` so
//! documents and queries land in compatible spaces.

use super::InputType;
use serde_json::json;

pub(super) const DEFAULT_MODEL: &str = "voyage-3-lite";
pub(super) const DEFAULT_BASE_URL: &str = "https://api.voyageai.com";
pub(super) const MAX_BATCH: usize = 128;

pub(super) fn request_body(
    model: &str,
    texts: &[String],
    input_type: InputType,
) -> serde_json::Value {
    json!({
        "model": model,
        "input": texts,
        "input_type": input_type.as_str(),
    })
}
