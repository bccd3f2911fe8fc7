//! HTTP embedder
//!
//! One client type for every provider, usable from sync and async code.
//! Underlying HTTP clients are built lazily on first use, so an embedder
//! used only from async code never constructs a blocking client (which
//! would own its own runtime) inside the caller's executor.

use crate::config::EmbedderConfig;
use crate::embedder::{check_batch, check_text, AsyncEmbedder, Embedder};
use crate::error::{EmbeddingError, EmbeddingResult};
use crate::provider::{InputType, Provider};
use async_trait::async_trait;
use dataclients_core::{retry_async, retry_blocking};
use once_cell::sync::OnceCell;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Embedder backed by a provider's HTTP API
pub struct HttpEmbedder {
    config: EmbedderConfig,
    endpoint: String,
    blocking: OnceCell<reqwest::blocking::Client>,
    client: OnceCell<reqwest::Client>,
}

impl HttpEmbedder {
    /// Create an embedder
    ///
    /// Fails with `Config` when a hosted provider has no API key.
    pub fn new(config: EmbedderConfig) -> EmbeddingResult<Self> {
        config.validate()?;
        let endpoint = format!("{}{}", config.base_url(), config.provider.path());
        Ok(HttpEmbedder {
            config,
            endpoint,
            blocking: OnceCell::new(),
            client: OnceCell::new(),
        })
    }

    /// Configuration in effect
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    /// Provider this embedder calls
    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    fn blocking_client(&self) -> EmbeddingResult<&reqwest::blocking::Client> {
        self.blocking.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(self.timeout())
                .build()
                .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {}", e)))
        })
    }

    fn async_client(&self) -> EmbeddingResult<&reqwest::Client> {
        self.client.get_or_try_init(|| {
            reqwest::Client::builder()
                .timeout(self.timeout())
                .build()
                .map_err(|e| EmbeddingError::Config(format!("failed to build HTTP client: {}", e)))
        })
    }

    fn post_blocking(&self, body: &serde_json::Value) -> EmbeddingResult<serde_json::Value> {
        let provider = self.provider().name();
        let mut request = self.blocking_client()?.post(&self.endpoint).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .map_err(|e| EmbeddingError::from_reqwest(provider, e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(EmbeddingError::from_status(provider, status.as_u16(), text));
        }
        response
            .json()
            .map_err(|e| EmbeddingError::malformed(provider, e.to_string()))
    }

    async fn post_async(&self, body: &serde_json::Value) -> EmbeddingResult<serde_json::Value> {
        let provider = self.provider().name();
        let mut request = self.async_client()?.post(&self.endpoint).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::from_reqwest(provider, e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::from_status(provider, status.as_u16(), text));
        }
        response
            .json()
            .await
            .map_err(|e| EmbeddingError::malformed(provider, e.to_string()))
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> EmbeddingResult<()> {
        if let Some(expected) = self.config.dimension {
            if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
                return Err(EmbeddingError::malformed(
                    self.provider().name(),
                    format!("expected dimension {}, got {}", expected, bad.len()),
                ));
            }
        }
        Ok(())
    }

    fn embed_texts_blocking(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        check_batch(texts)?;
        let provider = self.provider();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(provider.max_batch()) {
            let body = provider.request_body(self.config.model(), chunk, input_type);
            let vectors = retry_blocking(&self.config.retry, "embed", || {
                self.post_blocking(&body)
                    .and_then(|response| provider.parse_response(response, chunk.len()))
            })?;
            self.check_dimensions(&vectors)?;
            out.extend(vectors);
        }
        debug!(provider = provider.name(), count = out.len(), "embedded texts");
        Ok(out)
    }

    async fn embed_texts_async(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        check_batch(texts)?;
        let provider = self.provider();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(provider.max_batch()) {
            let body = provider.request_body(self.config.model(), chunk, input_type);
            let body = &body;
            let vectors = retry_async(&self.config.retry, "embed", || async move {
                self.post_async(body)
                    .await
                    .and_then(|response| provider.parse_response(response, chunk.len()))
            })
            .await?;
            self.check_dimensions(&vectors)?;
            out.extend(vectors);
        }
        debug!(provider = provider.name(), count = out.len(), "embedded texts");
        Ok(out)
    }
}

fn single(provider: Provider, mut vectors: Vec<Vec<f32>>) -> EmbeddingResult<Vec<f32>> {
    vectors
        .pop()
        .ok_or_else(|| EmbeddingError::malformed(provider.name(), "no embedding returned"))
}

impl fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("provider", &self.config.provider)
            .field("model", &self.config.model())
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.config.api_key.is_some())
            .finish()
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        check_text(text)?;
        let vectors = self.embed_texts_blocking(&[text.to_string()], InputType::Document)?;
        single(self.provider(), vectors)
    }

    fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        check_text(text)?;
        let vectors = self.embed_texts_blocking(&[text.to_string()], InputType::Query)?;
        single(self.provider(), vectors)
    }

    fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_texts_blocking(texts, InputType::Document)
    }

    fn dimension(&self) -> Option<usize> {
        self.config.dimension
    }
}

#[async_trait]
impl AsyncEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        check_text(text)?;
        let vectors = self
            .embed_texts_async(&[text.to_string()], InputType::Document)
            .await?;
        single(self.provider(), vectors)
    }

    async fn embed_query(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        check_text(text)?;
        let vectors = self
            .embed_texts_async(&[text.to_string()], InputType::Query)
            .await?;
        single(self.provider(), vectors)
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_texts_async(texts, InputType::Document).await
    }

    fn dimension(&self) -> Option<usize> {
        self.config.dimension
    }
}
