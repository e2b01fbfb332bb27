//! Configuration for the Assessa CLI.
//!
//! Provides the [`AssessaConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `ASSESSA_CONFIG` environment variable
//! 3. XDG default: `~/.config/assessa/config.toml`
//! 4. Built-in defaults

use std::path::PathBuf;

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};

use assessa_core::{ConfigProvider, EngineConfig, Error, Result};
use assessa_vector::VectorConfig;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Assessa CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessaConfig {
    /// Project name, used for env var prefixes and default paths.
    pub project_name: String,

    /// Root directory for index and model artifacts.
    pub data_dir: Option<String>,

    /// Default catalog records file for `assessa index`.
    pub catalog_path: Option<String>,

    /// Embedding and indexing configuration.
    pub vector: VectorConfig,

    /// Ranking pipeline configuration.
    pub engine: EngineConfig,
}

impl Default for AssessaConfig {
    fn default() -> Self {
        Self {
            project_name: "assessa".to_string(),
            data_dir: None,
            catalog_path: None,
            vector: VectorConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl AssessaConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            log::debug!("Loading config from {}", path.display());
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("ASSESSA");
        env_opts.add_section("vector");
        env_opts.add_section("engine");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("ASSESSA_CONFIG") {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("assessa").join("config.toml"))
    }

    /// Catalog records file: `explicit` if given, else `catalog_path`.
    pub fn catalog_file(&self, explicit: Option<&str>) -> Result<PathBuf> {
        explicit
            .or(self.catalog_path.as_deref())
            .map(PathBuf::from)
            .ok_or_else(|| {
                Error::config("no catalog file: pass --catalog or set catalog_path in the config")
            })
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `ASSESSA_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "ASSESSA", &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for AssessaConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(PathBuf::from(dir));
        }
        match dirs::data_dir() {
            Some(dir) => Ok(dir.join(&self.project_name)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine data dir: {e}"))),
        }
    }

    fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
