//! Embedding provider trait, timeout wrapper and mock implementation.
//!
//! This module defines the `EmbeddingProvider` trait that abstracts over the
//! embedding generation service. Catalog documents and queries are embedded
//! in different modes so providers with asymmetric models can prefix or
//! route them differently.
//!
//! # Providers
//!
//! - `MockEmbeddingProvider`: Deterministic fixed-dimension vectors for testing
//! - `TimeoutEmbedder`: Bounds every call on an inner provider
//! - `FastEmbedProvider`: Local embedding via fastembed (requires `vector-fastembed` feature)

use std::sync::Arc;
use std::time::Duration;

use assessa_core::{Error, Result};
use async_trait::async_trait;

/// Whether text is a catalog document or a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedMode {
    /// Catalog document text, embedded at corpus-build time.
    Document,
    /// Query text, embedded per request.
    Query,
}

/// Trait for generating text embeddings.
///
/// Implementations wrap specific embedding backends and provide a uniform
/// async interface. The trait requires `Send + Sync` to allow safe sharing
/// across async tasks.
///
/// # Thread Safety
///
/// Implementations should handle internal synchronization (e.g., `Arc<Mutex<>>`)
/// for thread-unsafe underlying libraries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Backends that support native batching should override this.
    async fn embed_batch(&self, texts: &[&str], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, mode).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// The provider name for diagnostics and artifact metadata.
    fn name(&self) -> &str;
}

// ============================================================================
// Timeout wrapper
// ============================================================================

/// Wraps a provider so every call is bounded by a timeout.
///
/// Provider errors and elapsed timeouts both surface as
/// [`Error::UpstreamUnavailable`]; callers never mistake an outage for an
/// empty result.
pub struct TimeoutEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl TimeoutEmbedder {
    /// Wrap `inner` with the given per-call timeout.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn upstream(&self, err: Error) -> Error {
        match err {
            Error::UpstreamUnavailable(_) => err,
            other => Error::upstream(format!("{} embedding failed: {other}", self.inner.name())),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TimeoutEmbedder {
    async fn embed(&self, text: &str, mode: EmbedMode) -> Result<Vec<f32>> {
        match tokio::time::timeout(self.timeout, self.inner.embed(text, mode)).await {
            Ok(Ok(vector)) => Ok(vector),
            Ok(Err(e)) => Err(self.upstream(e)),
            Err(_) => Err(Error::upstream(format!(
                "{} embedding timed out after {:?}",
                self.inner.name(),
                self.timeout
            ))),
        }
    }

    async fn embed_batch(&self, texts: &[&str], mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        match tokio::time::timeout(self.timeout, self.inner.embed_batch(texts, mode)).await {
            Ok(Ok(vectors)) => Ok(vectors),
            Ok(Err(e)) => Err(self.upstream(e)),
            Err(_) => Err(Error::upstream(format!(
                "{} batch embedding timed out after {:?}",
                self.inner.name(),
                self.timeout
            ))),
        }
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ============================================================================
// Mock
// ============================================================================

/// A mock embedding provider for testing and offline runs.
///
/// Generates deterministic vectors from the input bytes. The same text always
/// yields the same unit vector, regardless of mode.
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn deterministic_embedding(&self, text: &str) -> Vec<f32> {
        let bytes = text.as_bytes();
        let mut embedding: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let byte_val = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
                ((byte_val as f32 + i as f32) % 256.0) / 256.0
            })
            .collect();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
        Ok(self.deterministic_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str], _mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| self.deterministic_embedding(t))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct SlowProvider;

    #[async_trait]
    impl EmbeddingProvider for SlowProvider {
        async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1.0])
        }

        fn dimension(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl EmbeddingProvider for BrokenProvider {
        async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
            Err(Error::operation("connection refused"))
        }

        fn dimension(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_mock_provider_creation() {
        let provider = MockEmbeddingProvider::new(384);
        assert_eq!(provider.dimension(), 384);
        assert_eq!(provider.name(), "mock");
    }

    #[tokio::test]
    async fn test_mock_embed_unit_norm() {
        let provider = MockEmbeddingProvider::new(8);
        let embedding = provider
            .embed("java developer", EmbedMode::Query)
            .await
            .unwrap();
        assert_eq!(embedding.len(), 8);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_embed_deterministic_across_modes() {
        let provider = MockEmbeddingProvider::new(16);
        let doc = provider.embed("same text", EmbedMode::Document).await.unwrap();
        let query = provider.embed("same text", EmbedMode::Query).await.unwrap();
        assert_eq!(doc, query);

        let other = provider.embed("other text", EmbedMode::Query).await.unwrap();
        assert_ne!(doc, other);
    }

    #[tokio::test]
    async fn test_default_embed_batch_is_sequential() {
        let provider = BrokenProvider;
        let result = provider.embed_batch(&["a", "b"], EmbedMode::Document).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_embed_batch_empty() {
        let provider = MockEmbeddingProvider::new(4);
        let embeddings = provider.embed_batch(&[], EmbedMode::Document).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_upstream() {
        let wrapped = TimeoutEmbedder::new(Arc::new(SlowProvider), Duration::from_millis(50));
        let err = wrapped.embed("q", EmbedMode::Query).await.unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_upstream() {
        let wrapped = TimeoutEmbedder::new(Arc::new(BrokenProvider), Duration::from_secs(1));
        let err = wrapped.embed("q", EmbedMode::Query).await.unwrap_err();
        assert!(err.is_upstream());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(wrapped.name(), "broken");
    }

    #[tokio::test]
    async fn test_timeout_passes_through_success() {
        let wrapped = TimeoutEmbedder::new(
            Arc::new(MockEmbeddingProvider::new(4)),
            Duration::from_secs(1),
        );
        assert_eq!(wrapped.dimension(), 4);
        let vectors = wrapped
            .embed_batch(&["a", "b"], EmbedMode::Document)
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn EmbeddingProvider) {}
    }
}
