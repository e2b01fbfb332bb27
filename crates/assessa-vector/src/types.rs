//! Common types for the vector layer.
//!
//! These types are always available regardless of feature flags.

use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Embedding and indexing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Embedding provider: "fastembed" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model name (e.g., "bge-small-en-v1.5").
    #[serde(default = "default_model")]
    pub model: String,

    /// Model for the alternate embedding space used by the ensemble.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_model: Option<String>,

    /// Dimension for the mock provider.
    #[serde(default = "default_mock_dimension")]
    pub mock_dimension: usize,

    /// Path to cache directory for embedding models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,

    /// Batch size for document embedding during corpus builds.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_mock_dimension() -> usize {
    384
}

fn default_batch_size() -> usize {
    64
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            alternate_model: None,
            mock_dimension: default_mock_dimension(),
            cache_path: None,
            batch_size: default_batch_size(),
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// One nearest-neighbour hit from the index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    /// Position of the item in the corpus.
    pub position: usize,
    /// Cosine similarity to the query.
    pub score: f32,
}

// ============================================================================
// Build statistics
// ============================================================================

/// Statistics from a corpus build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusBuildStats {
    /// Number of items embedded.
    pub documents_indexed: usize,

    /// Batches that fell back to per-document embedding.
    pub batches_retried: usize,

    /// Embedding dimension used.
    pub embedding_dimension: usize,

    /// Catalog content hash.
    pub content_hash: String,

    /// Build duration in milliseconds.
    pub build_duration_ms: u64,

    /// Documents that could not be embedded and were stored as zero vectors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BuildError>,
}

/// A document that failed to embed during a corpus build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildError {
    /// Corpus position of the item.
    pub position: usize,
    /// The item's canonical URL.
    pub canonical_url: String,
    /// Error message.
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================
