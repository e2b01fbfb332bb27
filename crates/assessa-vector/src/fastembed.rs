//! FastEmbed embedding provider.
//!
//! Runs pre-trained sentence embedding models locally through the
//! `fastembed` crate. Serves both as the primary embedding space and, with a
//! different model, as the alternate space used by the ensemble.
//!
//! `fastembed::TextEmbedding` is not `Sync`, so the model sits behind
//! `Arc<Mutex<>>` and every call runs on `tokio::task::spawn_blocking`.
//!
//! Requires the `vector-fastembed` feature.

use std::sync::{Arc, Mutex};

use assessa_core::{Error, Result};
use async_trait::async_trait;

use crate::embedding::{EmbedMode, EmbeddingProvider};

/// Instruction prefix BGE models expect on retrieval queries.
const BGE_QUERY_PREFIX: &str = "Represent this sentence for searching relevant passages: ";

fn resolve_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "bge-small-en-v1.5" | "BGESmallENV15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" | "BGEBaseENV15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "all-minilm-l6-v2" | "AllMiniLML6V2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l12-v2" | "AllMiniLML12V2" => Ok(fastembed::EmbeddingModel::AllMiniLML12V2),
        other => Err(Error::config(format!(
            "Unknown embedding model: '{other}'. Supported: bge-small-en-v1.5, bge-base-en-v1.5, all-minilm-l6-v2, all-minilm-l12-v2"
        ))),
    }
}

fn default_query_prefix(name: &str) -> Option<String> {
    name.starts_with("bge-")
        .then(|| BGE_QUERY_PREFIX.to_string())
}

/// FastEmbed-based embedding provider.
///
/// | Name | Dimension |
/// |------|-----------|
/// | `bge-small-en-v1.5` | 384 |
/// | `bge-base-en-v1.5` | 768 |
/// | `all-minilm-l6-v2` | 384 |
/// | `all-minilm-l12-v2` | 384 |
pub struct FastEmbedProvider {
    model: Arc<Mutex<fastembed::TextEmbedding>>,
    dimension: usize,
    model_name: String,
    query_prefix: Option<String>,
}

impl FastEmbedProvider {
    /// Load `model_name`, downloading it into `cache_path` if needed.
    pub fn new(model_name: &str, cache_path: Option<&str>) -> Result<Self> {
        let model_enum = resolve_model(model_name)?;

        let mut init = fastembed::InitOptions::new(model_enum);
        if let Some(path) = cache_path {
            init = init.with_cache_dir(std::path::PathBuf::from(path));
        }

        let mut text_embedding = fastembed::TextEmbedding::try_new(init)
            .map_err(|e| Error::operation(format!("Failed to initialize fastembed model: {e}")))?;

        let probe = text_embedding
            .embed(vec!["dimension probe"], None)
            .map_err(|e| Error::operation(format!("Failed to probe embedding dimension: {e}")))?;
        let dimension = probe
            .first()
            .map(|v| v.len())
            .ok_or_else(|| Error::operation("Empty probe embedding"))?;

        log::info!("Loaded embedding model {model_name} (dimension {dimension})");

        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            dimension,
            model_name: model_name.to_string(),
            query_prefix: default_query_prefix(model_name),
        })
    }

    /// Override the prefix prepended to query-mode text.
    pub fn with_query_prefix(mut self, prefix: Option<String>) -> Self {
        self.query_prefix = prefix;
        self
    }

    fn prepare(&self, text: &str, mode: EmbedMode) -> String {
        match (mode, &self.query_prefix) {
            (EmbedMode::Query, Some(prefix)) => format!("{prefix}{text}"),
            _ => text.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text], mode).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::operation("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        let texts: Vec<String> = texts.iter().map(|t| self.prepare(t, mode)).collect();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| Error::operation(format!("Mutex poisoned: {e}")))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::operation(format!("Batch embedding failed: {e}")))
        })
        .await
        .map_err(|e| Error::operation(format!("spawn_blocking failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
