//! Error types for Assessa operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Assessa crates. Uses `thiserror` for derive macros.
//!
//! Three variants carry pipeline semantics that callers act on:
//!
//! - [`Error::UpstreamUnavailable`]: the embedding service failed or timed
//!   out; the query fails rather than returning an empty list.
//! - [`Error::IndexIntegrity`]: persisted artifacts are missing, partial or
//!   inconsistent; the engine refuses to serve from them.
//! - [`Error::TrainingDataInsufficient`]: too few positive examples to fit
//!   the learned reranker.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in Assessa operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic operation failure.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// The embedding service (or another upstream) failed or timed out.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Persisted index or model artifacts are missing, partial or inconsistent.
    #[error("Index integrity error: {0}")]
    IndexIntegrity(String),

    /// A stage produced nothing where something was required.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// Not enough positive examples to train the relevance model.
    #[error("Training data insufficient: {positives} positive samples, {required} required")]
    TrainingDataInsufficient {
        /// Positive samples collected.
        positives: usize,
        /// Minimum required.
        required: usize,
    },

    /// The engine has not finished loading (or failed to load).
    #[error("Engine not ready: {0}")]
    NotReady(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create an upstream-unavailable error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create an index integrity error.
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IndexIntegrity(msg.into())
    }

    /// Create an empty result error.
    pub fn empty(msg: impl Into<String>) -> Self {
        Self::EmptyResult(msg.into())
    }

    /// Create a not-ready error.
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::IoWithPath {
            path: path.into(),
            source,
        }
    }

    /// Whether this is an upstream failure.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }

    /// Whether this is an artifact integrity failure.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::IndexIntegrity(_))
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only transient failures qualify: upstream outages and raw I/O.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::Io(_) | Self::IoWithPath { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Assessa's Error type.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Tests
// ============================================================================
