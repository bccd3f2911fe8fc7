//! Embedding providers
//!
//! Each provider knows its endpoint, how to shape a request body for a batch
//! of texts and how to read vectors back out of the response. Transport and
//! retries live in [`crate::http`], shared by all of them.

mod ollama;
mod openai;
mod voyage;

use crate::error::EmbeddingResult;
use serde::{Deserialize, Serialize};

/// Whether text is embedded for storage or for querying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// Text written into a collection
    Document,
    /// Text used to search a collection
    Query,
}

impl InputType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Document => "document",
            InputType::Query => "query",
        }
    }
}

/// Embedding provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI embeddings API
    #[serde(alias = "open_ai")]
    OpenAi,
    /// Voyage AI embeddings API
    Voyage,
    /// Local Ollama server
    Ollama,
}

impl Provider {
    /// Name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Voyage => "voyage",
            Provider::Ollama => "ollama",
        }
    }

    /// Parse a provider name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Some(Provider::OpenAi),
            "voyage" | "voyageai" => Some(Provider::Voyage),
            "ollama" => Some(Provider::Ollama),
            _ => None,
        }
    }

    /// Hosted providers need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => openai::DEFAULT_MODEL,
            Provider::Voyage => voyage::DEFAULT_MODEL,
            Provider::Ollama => ollama::DEFAULT_MODEL,
        }
    }

    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => openai::DEFAULT_BASE_URL,
            Provider::Voyage => voyage::DEFAULT_BASE_URL,
            Provider::Ollama => ollama::DEFAULT_BASE_URL,
        }
    }

    /// Most texts accepted in one request
    pub fn max_batch(&self) -> usize {
        match self {
            Provider::OpenAi => openai::MAX_BATCH,
            Provider::Voyage => voyage::MAX_BATCH,
            Provider::Ollama => 1,
        }
    }

    /// Endpoint path appended to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Provider::OpenAi | Provider::Voyage => "/v1/embeddings",
            Provider::Ollama => "/api/embeddings",
        }
    }

    /// Request body for one batch (at most `max_batch` texts)
    pub fn request_body(
        &self,
        model: &str,
        texts: &[String],
        input_type: InputType,
    ) -> serde_json::Value {
        match self {
            Provider::OpenAi => openai::request_body(model, texts),
            Provider::Voyage => voyage::request_body(model, texts, input_type),
            Provider::Ollama => ollama::request_body(model, texts),
        }
    }

    /// Vectors from a response, in request order
    pub fn parse_response(
        &self,
        body: serde_json::Value,
        expected: usize,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        let vectors = match self {
            Provider::OpenAi | Provider::Voyage => openai::parse_indexed(self.name(), body)?,
            Provider::Ollama => ollama::parse_response(body)?,
        };
        if vectors.len() != expected {
            return Err(crate::error::EmbeddingError::malformed(
                self.name(),
                format!("expected {} embeddings, got {}", expected, vectors.len()),
            ));
        }
        Ok(vectors)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
