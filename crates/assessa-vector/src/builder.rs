//! Corpus builder: composes, embeds and indexes catalog items.
//!
//! # Pipeline
//!
//! 1. Compose document text for every item with a [`DocumentComposer`]
//! 2. Embed texts in batches of `batch_size` (document mode)
//! 3. If a batch fails, embed its documents one at a time
//! 4. A document that still fails becomes a zero vector and a [`BuildError`]
//! 5. Normalize and index vectors in catalog order
//!
//! A zero vector scores 0.0 against every query, so a failed document stays
//! addressable by position without ever outranking a real match.

use std::sync::Arc;
use std::time::Instant;

use assessa_core::{CatalogItem, Error, Result};

use crate::composer::{CatalogComposer, DocumentComposer};
use crate::corpus::Corpus;
use crate::embedding::{EmbedMode, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::types::{BuildError, CorpusBuildStats};

/// Builds a [`Corpus`] from catalog items.
pub struct CorpusBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    composer: Arc<dyn DocumentComposer>,
    batch_size: usize,
}

impl CorpusBuilder {
    /// Create a builder with the default composer and batch size 64.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            composer: Arc::new(CatalogComposer),
            batch_size: 64,
        }
    }

    /// Use a different document composer.
    pub fn with_composer(mut self, composer: Arc<dyn DocumentComposer>) -> Self {
        self.composer = composer;
        self
    }

    /// Set the embedding batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Embed and index `items`.
    ///
    /// Individual document failures never abort the build. An error is
    /// returned only when the provider reports a zero dimension or a vector
    /// of the wrong length.
    pub async fn build(&self, items: Vec<CatalogItem>) -> Result<(Corpus, CorpusBuildStats)> {
        let start = Instant::now();
        let dimension = self.provider.dimension();
        if dimension == 0 {
            return Err(Error::config(format!(
                "embedding provider '{}' reports dimension 0",
                self.provider.name()
            )));
        }

        let items: Vec<Arc<CatalogItem>> = items.into_iter().map(Arc::new).collect();
        let texts: Vec<String> = items.iter().map(|item| self.composer.compose(item)).collect();

        let mut stats = CorpusBuildStats {
            embedding_dimension: dimension,
            ..CorpusBuildStats::default()
        };
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(items.len());

        for (batch_index, chunk) in texts.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();

            match self.provider.embed_batch(&refs, EmbedMode::Document).await {
                Ok(batch) if batch.len() == refs.len() => vectors.extend(batch),
                outcome => {
                    let reason = match outcome {
                        Ok(batch) => format!("returned {} vectors for {}", batch.len(), refs.len()),
                        Err(e) => e.to_string(),
                    };
                    log::warn!(
                        "Batch {batch_index} failed ({reason}); embedding {} documents individually",
                        refs.len()
                    );
                    stats.batches_retried += 1;
                    for (i, text) in refs.iter().enumerate() {
                        let position = offset + i;
                        match self.provider.embed(text, EmbedMode::Document).await {
                            Ok(vector) => vectors.push(vector),
                            Err(e) => {
                                let canonical_url = items
                                    .get(position)
                                    .map(|item| item.canonical_url.clone())
                                    .unwrap_or_default();
                                log::warn!(
                                    "Failed to embed {canonical_url}: {e}; storing zero vector"
                                );
                                stats.errors.push(BuildError {
                                    position,
                                    canonical_url,
                                    message: e.to_string(),
                                });
                                vectors.push(vec![0.0; dimension]);
                            }
                        }
                    }
                }
            }
        }

        let index = VectorIndex::from_vectors(dimension, vectors)?;
        let corpus = Corpus::new(items, index)?;

        stats.documents_indexed = corpus.len();
        stats.content_hash = corpus.content_hash().to_string();
        stats.build_duration_ms = start.elapsed().as_millis() as u64;

        log::info!(
            "Built corpus with {} documents ({} failed) using {} in {}ms",
            stats.documents_indexed,
            stats.errors.len(),
            self.provider.name(),
            stats.build_duration_ms
        );

        Ok((corpus, stats))
    }
}

// ============================================================================
// Tests
// ============================================================================
