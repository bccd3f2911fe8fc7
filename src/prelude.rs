//! Convenient imports for dataclients.
//!
//! ```ignore
//! use dataclients::prelude::*;
//!
//! let clients = DataClients::open(ClientsConfig::default())?;
//! ```

// Entry points
pub use crate::clients::{AsyncDataClients, DataClients, DataClientsBuilder, Document};
pub use crate::config::ClientsConfig;

// Error handling
pub use crate::error::{Error, Result};

// Records and queries
pub use dataclients_core::{
    DistanceMetric, ErrorKind, Filter, Payload, Range, SearchRequest, SearchResult, VectorRecord,
};

// Clients
pub use dataclients_embed::{EmbedderConfig, Provider};
pub use dataclients_vectorstore::{Backend, StoreConfig};
