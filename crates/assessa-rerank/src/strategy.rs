//! Ordered reranking strategies with structural fallback.
//!
//! A [`RerankChain`] holds its strategies in priority order
//! (learned, LLM, rule-based). Each is tried in turn behind the same
//! `attempt` contract; the first success wins. The rule-based strategy is
//! always present, always last, and cannot fail, so the chain always
//! produces a ranking.

use std::fmt;

use thiserror::Error;

use assessa_core::{Candidate, QuerySignals};

use crate::external::LlmReranker;
use crate::learned::LearnedReranker;
use crate::rules::RuleBasedReranker;

/// Why a reranking strategy could not produce a ranking.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RerankFailure {
    /// The external call did not complete in time.
    #[error("timed out after {after_ms} ms")]
    Timeout {
        /// Configured timeout.
        after_ms: u64,
    },

    /// The completion provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The reply named no known candidate.
    #[error("unusable response: {0}")]
    UnmappedResponse(String),
}

/// Strategy identifiers, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrategyKind {
    /// Trained relevance model.
    Learned,
    /// LLM-assisted ordering.
    External,
    /// Additive rule bonuses.
    RuleBased,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Learned => "learned",
            Self::External => "llm",
            Self::RuleBased => "rule-based",
        })
    }
}

/// A reranking strategy.
#[derive(Debug, Clone)]
pub enum RerankStrategy {
    /// Trained relevance model.
    Learned(LearnedReranker),
    /// LLM-assisted ordering.
    External(LlmReranker),
    /// Additive rule bonuses.
    RuleBased(RuleBasedReranker),
}

impl RerankStrategy {
    /// The strategy's identifier.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Learned(_) => StrategyKind::Learned,
            Self::External(_) => StrategyKind::External,
            Self::RuleBased(_) => StrategyKind::RuleBased,
        }
    }

    /// Rank `candidates` and keep the top `top_k`.
    pub async fn attempt(
        &self,
        signals: &QuerySignals,
        candidates: &[Candidate],
        top_k: usize,
    ) -> Result<Vec<Candidate>, RerankFailure> {
        let mut ranked = match self {
            Self::Learned(reranker) => reranker.rerank(signals, candidates.to_vec()),
            Self::External(reranker) => reranker.rerank(signals, candidates, top_k).await?,
            Self::RuleBased(reranker) => reranker.rerank(signals, candidates.to_vec()),
        };
        ranked.truncate(top_k);
        Ok(ranked)
    }
}

/// Result of running a chain.
#[derive(Debug, Clone)]
pub struct RerankOutcome {
    /// Final ranking, at most `top_k` long.
    pub candidates: Vec<Candidate>,
    /// Strategy that produced it.
    pub strategy: StrategyKind,
    /// Strategies that were tried and failed, in order.
    pub failures: Vec<(StrategyKind, RerankFailure)>,
}

/// Strategies in priority order, ending with the rule-based fallback.
#[derive(Debug, Clone)]
pub struct RerankChain {
    strategies: Vec<RerankStrategy>,
}

impl Default for RerankChain {
    fn default() -> Self {
        Self::new(RuleBasedReranker::default())
    }
}

impl RerankChain {
    /// A chain holding only the rule-based fallback.
    pub fn new(rules: RuleBasedReranker) -> Self {
        Self {
            strategies: vec![RerankStrategy::RuleBased(rules)],
        }
    }

    /// Add or replace the learned strategy.
    pub fn with_learned(self, reranker: LearnedReranker) -> Self {
        self.with_strategy(RerankStrategy::Learned(reranker))
    }

    /// Add or replace the LLM strategy.
    pub fn with_external(self, reranker: LlmReranker) -> Self {
        self.with_strategy(RerankStrategy::External(reranker))
    }

    /// Add or replace a strategy, keeping priority order.
    pub fn with_strategy(mut self, strategy: RerankStrategy) -> Self {
        let kind = strategy.kind();
        self.strategies.retain(|s| s.kind() != kind);
        self.strategies.push(strategy);
        self.strategies.sort_by_key(RerankStrategy::kind);
        self
    }

    /// Strategies in the order they are tried.
    pub fn strategies(&self) -> &[RerankStrategy] {
        &self.strategies
    }

    /// Whether a strategy of `kind` is configured.
    pub fn has(&self, kind: StrategyKind) -> bool {
        self.strategies.iter().any(|s| s.kind() == kind)
    }

    /// The LLM strategy, if configured.
    pub fn external(&self) -> Option<&LlmReranker> {
        self.strategies.iter().find_map(|s| match s {
            RerankStrategy::External(r) => Some(r),
            _ => None,
        })
    }

    /// Run the chain.
    ///
    /// Strategies rejected by `allow` are skipped (the rule-based fallback
    /// never is). Failures are logged at warn level and recorded in the
    /// outcome.
    pub async fn rerank(
        &self,
        signals: &QuerySignals,
        candidates: &[Candidate],
        top_k: usize,
        allow: impl Fn(StrategyKind) -> bool,
    ) -> RerankOutcome {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            let kind = strategy.kind();
            if kind != StrategyKind::RuleBased && !allow(kind) {
                continue;
            }
            match strategy.attempt(signals, candidates, top_k).await {
                Ok(ranked) => {
                    log::debug!("Reranked {} candidates with {kind} strategy", candidates.len());
                    return RerankOutcome {
                        candidates: ranked,
                        strategy: kind,
                        failures,
                    };
                }
                Err(failure) => {
                    log::warn!("{kind} reranking failed, falling back: {failure}");
                    failures.push((kind, failure));
                }
            }
        }

        // Only reached if the rule-based strategy was filtered out.
        let mut ranked = RuleBasedReranker::default().rerank(signals, candidates.to_vec());
        ranked.truncate(top_k);
        RerankOutcome {
            candidates: ranked,
            strategy: StrategyKind::RuleBased,
            failures,
        }
    }
}
