//! Assessa Core: shared types, identity, configuration and errors.
//!
//! This crate provides the foundational types used across all Assessa
//! crates. It has no internal Assessa dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`identity`]: URL canonicalization and identity sets
//! - [`category`]: Assessment category parsing
//! - [`catalog`]: Catalog item records
//! - [`signals`]: Structured query signals
//! - [`candidate`]: Per-query candidates and score ordering
//! - [`config`]: Engine configuration
//! - [`traits`]: Host integration traits

pub mod candidate;
pub mod catalog;
pub mod category;
pub mod config;
pub mod error;
pub mod identity;
pub mod signals;
pub mod traits;

// Re-export key types at crate root for convenience
pub use candidate::{Candidate, ScoreField, is_sorted_by_score, sort_by_score};
pub use catalog::CatalogItem;
pub use category::Category;
pub use config::{
    EngineConfig, EnsembleConfig, ExternalRerankConfig, FilterConfig, LearnedRerankConfig,
    RetrievalConfig, RuleBonuses, ScoringWeights,
};
pub use error::{Error, Result};
pub use identity::{IdentitySet, mirror_url, normalize, urls_match, variants};
pub use signals::{QuerySignals, Seniority};
pub use traits::ConfigProvider;
