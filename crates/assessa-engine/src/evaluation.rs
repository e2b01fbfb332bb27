//! Recall evaluation against labeled queries.

use serde::{Deserialize, Serialize};

use assessa_core::{IdentitySet, Result};
use assessa_rerank::LabeledQuery;

use crate::engine::{Engine, RetrievalStrategy};
use crate::recommendation::Recommendation;

/// Fraction of `relevant` entities found among the first `k` results.
///
/// A relevant entity counts as found when its identity set intersects any
/// of the top-k results' identity sets. An empty `relevant` list scores 0.
pub fn recall_at_k(results: &[Recommendation], relevant: &[IdentitySet], k: usize) -> f32 {
    if relevant.is_empty() {
        return 0.0;
    }
    let retrieved: Vec<IdentitySet> = results.iter().take(k).map(Recommendation::identity).collect();
    let found = relevant
        .iter()
        .filter(|r| retrieved.iter().any(|got| got.intersects(r)))
        .count();
    found as f32 / relevant.len() as f32
}

/// Recall for one labeled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecall {
    /// Query text.
    pub query: String,
    /// Relevant entities found in the top k.
    pub found: usize,
    /// Relevant entities labeled.
    pub relevant: usize,
    /// `found / relevant`.
    pub recall: f32,
}

/// Recall over a labeled query set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Cutoff.
    pub k: usize,
    /// Retrieval strategy evaluated.
    pub strategy: RetrievalStrategy,
    /// Whether the learned reranker was allowed.
    pub use_learned_rerank: bool,
    /// Per-query results, in input order.
    pub queries: Vec<QueryRecall>,
    /// Mean of the per-query recalls.
    pub mean_recall: f32,
}

/// Run every labeled query and measure recall at `k`.
pub async fn evaluate(
    engine: &Engine,
    labeled: &[LabeledQuery],
    k: usize,
    strategy: RetrievalStrategy,
    use_learned_rerank: bool,
) -> Result<EvaluationReport> {
    let mut queries = Vec::with_capacity(labeled.len());

    for query in labeled {
        let results = engine
            .retrieve(&query.query, k, strategy, use_learned_rerank)
            .await?;
        let relevant = query.relevant_sets();
        let recall = recall_at_k(&results, &relevant, k);
        log::debug!("recall@{k} = {recall:.3} for '{}'", query.query);
        queries.push(QueryRecall {
            query: query.query.clone(),
            found: (recall * relevant.len() as f32).round() as usize,
            relevant: relevant.len(),
            recall,
        });
    }

    let mean_recall = if queries.is_empty() {
        0.0
    } else {
        queries.iter().map(|q| q.recall).sum::<f32>() / queries.len() as f32
    };
    log::info!(
        "Mean recall@{k} over {} queries ({strategy}): {mean_recall:.4}",
        queries.len()
    );

    Ok(EvaluationReport {
        k,
        strategy,
        use_learned_rerank,
        queries,
        mean_recall,
    })
}

/// Mean recall at `k` over `labeled`.
pub async fn mean_recall_at_k(
    engine: &Engine,
    labeled: &[LabeledQuery],
    k: usize,
    strategy: RetrievalStrategy,
) -> Result<f32> {
    Ok(evaluate(engine, labeled, k, strategy, true).await?.mean_recall)
}
