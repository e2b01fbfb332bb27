//! The Assessa ranking engine.
//!
//! Ties the lower crates together into one immutable [`Engine`]:
//!
//! - [`engine`]: `EngineBuilder`, the hybrid path and the ensemble path
//! - [`ensemble`]: multi-strategy fusion
//! - [`state`]: lifecycle handle with explicit reload
//! - [`training`]: offline training of the learned reranker
//! - [`evaluation`]: recall against labeled queries
//! - [`recommendation`]: the caller-facing result record
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use assessa_engine::{EngineBuilder, RetrievalStrategy};
//! use assessa_vector::load_corpus;
//!
//! let (corpus, _) = load_corpus(&index_dir)?;
//! let engine = EngineBuilder::new(Arc::new(corpus), provider)
//!     .with_model_file(&model_path)
//!     .build()?;
//! let results = engine
//!     .retrieve("java developer, 40 minutes", 10, RetrievalStrategy::Hybrid, true)
//!     .await?;
//! ```

pub mod engine;
pub mod ensemble;
pub mod evaluation;
pub mod recommendation;
pub mod state;
pub mod training;

pub use engine::{Engine, EngineBuilder, Ranking, RetrievalStrategy};
pub use ensemble::{EnsembleStrategy, StrategyList, fuse};
pub use evaluation::{EvaluationReport, QueryRecall, evaluate, mean_recall_at_k, recall_at_k};
pub use recommendation::Recommendation;
pub use state::{EngineHandle, EngineState, EngineStatus};
pub use training::{LazyTrainer, train_reranker};
