//! Distance metrics and collection configuration
//!
//! All metrics are normalized to "higher = more similar" at the interface
//! boundary. Backends that report distances convert before results leave
//! the adapter.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Distance metric for similarity calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity: dot(a,b) / (||a|| * ||b||)
    /// Range: [-1, 1], higher = more similar
    #[default]
    Cosine,

    /// Dot product (raw value)
    /// Range: unbounded, higher = more similar
    #[serde(alias = "dot", alias = "ip")]
    DotProduct,

    /// Euclidean similarity: 1 / (1 + l2_distance)
    /// Range: (0, 1], higher = more similar
    #[serde(alias = "l2")]
    Euclidean,
}

impl DistanceMetric {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
            DistanceMetric::Euclidean => "euclidean",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Some(DistanceMetric::Cosine),
            "dot_product" | "dot" | "ip" | "inner_product" => Some(DistanceMetric::DotProduct),
            "euclidean" | "l2" | "euclid" => Some(DistanceMetric::Euclidean),
            _ => None,
        }
    }

    /// Normalized similarity between two vectors of equal length
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::DotProduct => dot(a, b),
            DistanceMetric::Euclidean => euclidean_score(l2_distance(a, b)),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Dot product
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm
pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}

/// L2 distance
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Map an L2 distance to "higher = more similar"
pub fn euclidean_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Requested configuration for collections a store creates
///
/// Immutable once a collection exists: reopening a collection whose stored
/// configuration differs is a conflict, never auto-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Embedding dimension (e.g., 384, 768, 1536)
    ///
    /// `None` lets a lazily-created collection take the dimensionality of
    /// its first write.
    pub dimension: Option<usize>,

    /// Distance metric for similarity calculation
    pub metric: DistanceMetric,
}

impl CollectionConfig {
    /// Create a config with a fixed dimension
    pub fn new(dimension: usize, metric: DistanceMetric) -> Result<Self, ValidationError> {
        if dimension == 0 {
            return Err(ValidationError::InvalidDimension(dimension));
        }
        Ok(CollectionConfig {
            dimension: Some(dimension),
            metric,
        })
    }

    /// Config whose dimension is set by the first write
    pub fn inferred(metric: DistanceMetric) -> Self {
        CollectionConfig {
            dimension: None,
            metric,
        }
    }

    /// Reject a zero dimension
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.dimension {
            Some(0) => Err(ValidationError::InvalidDimension(0)),
            _ => Ok(()),
        }
    }

    /// Describe how an existing collection conflicts with this config
    ///
    /// Returns `None` when they are compatible.
    pub fn conflict_with(&self, existing: &CollectionInfo) -> Option<String> {
        if let Some(dimension) = self.dimension {
            if dimension != existing.dimension {
                return Some(format!(
                    "dimension {} requested, collection has {}",
                    dimension, existing.dimension
                ));
            }
        }
        if self.metric != existing.metric {
            return Some(format!(
                "metric {} requested, collection has {}",
                self.metric, existing.metric
            ));
        }
        None
    }
}

/// Configuration of a collection as it exists in a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Dimensionality every stored vector has
    pub dimension: usize,
    /// Metric the collection was created with
    pub metric: DistanceMetric,
}
