//! Embedder configuration

use crate::error::{EmbeddingError, EmbeddingResult};
use crate::provider::Provider;
use dataclients_core::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Embedder configuration
///
/// Credentials are always explicit; nothing is read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Which provider to call
    pub provider: Provider,
    /// API key (required for hosted providers)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name; provider default when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL; provider default when absent
    #[serde(default)]
    pub base_url: Option<String>,
    /// Expected output length; responses of another length are rejected
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl EmbedderConfig {
    /// Config for a provider with its defaults
    pub fn new(provider: Provider) -> Self {
        EmbedderConfig {
            provider,
            api_key: None,
            model: None,
            base_url: None,
            dimension: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the expected dimension
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Model name in effect
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Base URL in effect, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Check the config is usable
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.provider.requires_api_key()
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(EmbeddingError::Config(format!(
                "{} requires an api_key",
                self.provider.name()
            )));
        }
        if self.dimension == Some(0) {
            return Err(EmbeddingError::Config("dimension must be > 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(EmbeddingError::Config("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}
