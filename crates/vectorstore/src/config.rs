//! Store configuration
//!
//! Plain serde structs, loadable from the `[store]` table of a TOML file.
//! Every field except `backend` has a default.

use crate::error::{VectorError, VectorResult};
use dataclients_core::{CollectionConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default cap on `n_results`
pub const DEFAULT_MAX_N_RESULTS: usize = 10_000;

/// Which adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Chroma on a local server process (sync)
    #[default]
    EmbeddedLocal,
    /// Qdrant, blocking client
    ServerSync,
    /// Qdrant, non-blocking client
    ServerAsync,
}

impl Backend {
    /// Config name
    pub fn name(&self) -> &'static str {
        match self {
            Backend::EmbeddedLocal => "embedded-local",
            Backend::ServerSync => "server-sync",
            Backend::ServerAsync => "server-async",
        }
    }

    /// Whether this backend is driven through [`crate::AsyncVectorStore`]
    pub fn is_async(&self) -> bool {
        matches!(self, Backend::ServerAsync)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Qdrant endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    /// REST base URL
    pub url: String,
    /// Sent as the `api-key` header when set
    pub api_key: Option<String>,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        QdrantConfig {
            url: "http://localhost:6333".to_string(),
            api_key: None,
        }
    }
}

/// Chroma endpoint and optional local server process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaConfig {
    /// REST base URL; derived from `host` and `port` when absent
    pub url: Option<String>,
    /// Persistence directory for a spawned server
    pub persist_dir: Option<PathBuf>,
    /// Launch `chroma run` on first use
    pub spawn: bool,
    /// Executable used when spawning
    pub executable: String,
    /// Bind host for a spawned server
    pub host: String,
    /// Bind port for a spawned server
    pub port: u16,
    /// How long to wait for a spawned server to answer heartbeats
    pub startup_timeout_ms: u64,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        ChromaConfig {
            url: None,
            persist_dir: None,
            spawn: false,
            executable: "chroma".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            startup_timeout_ms: 20_000,
        }
    }
}

impl ChromaConfig {
    /// Base URL in effect, without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Adapter to use
    #[serde(default)]
    pub backend: Backend,
    /// Dimension and metric for collections this store creates
    #[serde(default)]
    pub collection: CollectionConfig,
    /// Records per write; backend default when absent
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Cap on `n_results`; larger requests are clamped
    #[serde(default)]
    pub max_n_results: Option<usize>,
    /// Timeout for every remote call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Qdrant settings (server backends)
    #[serde(default)]
    pub qdrant: QdrantConfig,
    /// Chroma settings (embedded-local backend)
    #[serde(default)]
    pub chroma: ChromaConfig,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(Backend::default())
    }
}

impl StoreConfig {
    /// Defaults for a backend
    pub fn new(backend: Backend) -> Self {
        StoreConfig {
            backend,
            collection: CollectionConfig::default(),
            batch_size: None,
            max_n_results: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            qdrant: QdrantConfig::default(),
            chroma: ChromaConfig::default(),
        }
    }

    /// Set collection defaults
    pub fn with_collection(mut self, collection: CollectionConfig) -> Self {
        self.collection = collection;
        self
    }

    /// Override the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Override the `n_results` cap
    pub fn with_max_n_results(mut self, max: usize) -> Self {
        self.max_n_results = Some(max);
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the Qdrant URL
    pub fn with_qdrant_url(mut self, url: impl Into<String>) -> Self {
        self.qdrant.url = url.into();
        self
    }

    /// Use a Chroma server at a URL
    pub fn with_chroma_url(mut self, url: impl Into<String>) -> Self {
        self.chroma.url = Some(url.into());
        self
    }

    /// Spawn a local Chroma server persisting into `dir`
    pub fn with_chroma_persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chroma.persist_dir = Some(dir.into());
        self.chroma.spawn = true;
        self
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective `n_results` cap
    pub fn max_n_results(&self) -> usize {
        self.max_n_results.unwrap_or(DEFAULT_MAX_N_RESULTS)
    }

    /// Check the config is usable
    pub fn validate(&self) -> VectorResult<()> {
        self.collection.validate()?;
        if self.batch_size == Some(0) {
            return Err(VectorError::Config("batch_size must be > 0".to_string()));
        }
        if self.max_n_results == Some(0) {
            return Err(VectorError::Config("max_n_results must be > 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(VectorError::Config("timeout_ms must be > 0".to_string()));
        }
        if self.chroma.spawn && self.chroma.persist_dir.is_none() {
            return Err(VectorError::Config(
                "chroma.spawn requires chroma.persist_dir".to_string(),
            ));
        }
        Ok(())
    }
}
