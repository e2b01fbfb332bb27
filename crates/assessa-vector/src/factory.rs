//! Embedding provider construction from configuration.

use std::sync::Arc;

use assessa_core::{Error, Result};

use crate::embedding::{EmbeddingProvider, MockEmbeddingProvider};
use crate::types::VectorConfig;

/// Create the primary embedding provider named by `config.provider`.
///
/// # Errors
///
/// Returns a configuration error for unknown providers, or for `fastembed`
/// when the crate was built without the `vector-fastembed` feature.
pub fn create_embedding_provider(config: &VectorConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    create_provider(&config.provider, &config.model, config)
}

/// Create the alternate-space provider, if `config.alternate_model` is set.
pub fn create_alternate_provider(
    config: &VectorConfig,
) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    match &config.alternate_model {
        Some(model) => create_provider(&config.provider, model, config).map(Some),
        None => Ok(None),
    }
}

fn create_provider(
    provider: &str,
    model: &str,
    config: &VectorConfig,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match provider {
        "mock" => {
            // Distinct models get distinct dimensions so spaces never alias.
            let dimension = if model == config.model {
                config.mock_dimension
            } else {
                config.mock_dimension / 2
            };
            Ok(Arc::new(MockEmbeddingProvider::new(dimension.max(1))))
        }
        #[cfg(feature = "vector-fastembed")]
        "fastembed" => Ok(Arc::new(crate::fastembed::FastEmbedProvider::new(
            model,
            config.cache_path.as_deref(),
        )?)),
        #[cfg(not(feature = "vector-fastembed"))]
        "fastembed" => Err(Error::config(
            "provider 'fastembed' requires the vector-fastembed feature",
        )),
        other => Err(Error::config(format!(
            "Unknown embedding provider: '{other}'. Supported: mock, fastembed"
        ))),
    }
}
