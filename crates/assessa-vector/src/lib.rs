//! Vector layer for Assessa.
//!
//! This crate embeds catalog items, holds them in an exact in-memory cosine
//! index and persists the result as a validated artifact pair.
//!
//! # Features
//!
//! - `vector-fastembed`: Enable local embedding generation via fastembed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     assessa-vector                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait (document / query modes)           │
//! │  ├── MockEmbeddingProvider (always available)               │
//! │  ├── TimeoutEmbedder (bounds calls, maps to Upstream)       │
//! │  └── FastEmbedProvider (feature: vector-fastembed)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DocumentComposer trait (item text composition)             │
//! │  CorpusBuilder (batch embed with per-document fallback)     │
//! │  VectorIndex + Corpus (position-aligned items and vectors)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Persistence (catalog/vector pair, content hash checks)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use assessa_vector::{CorpusBuilder, MockEmbeddingProvider, save_corpus};
//!
//! let provider = Arc::new(MockEmbeddingProvider::new(384));
//! let (corpus, stats) = CorpusBuilder::new(provider).build(items).await?;
//! save_corpus(&index_dir, &corpus, "mock", "mock-384")?;
//! ```

pub mod builder;
pub mod composer;
pub mod corpus;
pub mod embedding;
pub mod factory;
pub mod index;
pub mod persistence;
pub mod types;

#[cfg(feature = "vector-fastembed")]
pub mod fastembed;

// Re-exports: core types
pub use types::{BuildError, CorpusBuildStats, VectorConfig, VectorHit};

// Re-exports: embedding
pub use embedding::{EmbedMode, EmbeddingProvider, MockEmbeddingProvider, TimeoutEmbedder};
pub use factory::{create_alternate_provider, create_embedding_provider};

// Re-exports: corpus
pub use builder::CorpusBuilder;
pub use composer::{CatalogComposer, DocumentComposer, NameOnlyComposer};
pub use corpus::{Corpus, catalog_hash};
pub use index::VectorIndex;

// Re-exports: persistence
pub use persistence::{
    ALTERNATE_SPACE, IndexMetadata, is_index_fresh, load_corpus, load_metadata, load_space,
    read_catalog_file, save_corpus, save_space,
};

#[cfg(feature = "vector-fastembed")]
pub use fastembed::FastEmbedProvider;
