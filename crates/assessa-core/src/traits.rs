//! Core traits for Assessa host integration.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where an
//! application keeps its artifacts and which engine configuration it runs.

use std::path::PathBuf;

use crate::Result;
use crate::config::EngineConfig;

/// Trait for host-specific configuration.
///
/// Every Assessa host (the CLI, a service, a test harness) implements this to
/// tell the engine where the catalog, index and model artifacts live.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use assessa_core::{ConfigProvider, EngineConfig, Result};
///
/// #[derive(Clone)]
/// struct HostConfig {
///     data_dir: PathBuf,
///     engine: EngineConfig,
/// }
///
/// impl ConfigProvider for HostConfig {
///     fn project_name(&self) -> &str {
///         "assessa"
///     }
///
///     fn data_dir(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
///
///     fn engine_config(&self) -> &EngineConfig {
///         &self.engine
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Root directory for index and model artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be determined.
    fn data_dir(&self) -> Result<PathBuf>;

    /// Ranking pipeline configuration.
    fn engine_config(&self) -> &EngineConfig;

    /// Directory holding the persisted catalog/vector artifact pair.
    fn index_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("index"))
    }

    /// Path of the learned reranker model artifact.
    fn model_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("models").join("reranker.json"))
    }
}
