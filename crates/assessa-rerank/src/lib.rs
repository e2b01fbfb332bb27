//! Reranking for Assessa.
//!
//! After hybrid scoring and soft filtering, the candidate pool is reordered
//! by the first strategy in the [`RerankChain`] that succeeds:
//!
//! ```text
//! Learned (trained relevance model)
//!   └─ fails / absent → External (LLM ordering, bounded by a timeout)
//!                          └─ fails / absent → RuleBased (never fails)
//! ```
//!
//! The crate also owns the pieces needed to produce the learned model
//! offline: feature extraction, the boosted-tree classifier, labeled query
//! loading and training-set assembly.

pub mod external;
pub mod features;
pub mod gbdt;
pub mod learned;
pub mod llm;
pub mod model;
pub mod rules;
pub mod strategy;
pub mod training;

pub use external::{LlmReranker, apply_ranking, parse_ranked_urls};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureExtractor};
pub use gbdt::{GbdtParams, GradientBoostedTrees};
pub use learned::LearnedReranker;
pub use llm::{CompletionProvider, MockCompletionProvider, RetryWrapper};
pub use model::{RelevanceModel, TrainingSummary};
pub use rules::RuleBasedReranker;
pub use strategy::{RerankChain, RerankFailure, RerankOutcome, RerankStrategy, StrategyKind};
pub use training::{LabeledQuery, TrainingSet, load_labeled_queries, parse_labeled_queries};
