//! Configuration file loading.
//!
//! One TOML file configures both clients:
//!
//! ```toml
//! [store]
//! backend = "server-sync"
//!
//! [store.collection]
//! dimension = 768
//! metric = "cosine"
//!
//! [embedder]
//! provider = "ollama"
//! ```
//!
//! Credentials come from the file only; nothing is read from the
//! environment.

use crate::error::Result;
use dataclients_embed::EmbedderConfig;
use dataclients_vectorstore::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for every client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientsConfig {
    /// Vector store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedder settings; text queries fail without one
    #[serde(default)]
    pub embedder: Option<EmbedderConfig>,
}

impl ClientsConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ClientsConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Check both sections are usable.
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        if let Some(embedder) = &self.embedder {
            embedder.validate()?;
        }
        Ok(())
    }
}
