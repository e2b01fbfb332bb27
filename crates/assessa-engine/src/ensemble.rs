//! Ensemble fusion.
//!
//! Each strategy variant produces its own ranked list on its own score
//! scale. [`fuse`] merges them into one ranking:
//!
//! - items are deduplicated across lists by identity-set intersection, in
//!   first-seen order (lists in the order given, then rank order);
//! - each list contributes at most one `(score, rank)` pair per item;
//! - `weighted_top = top_weight * s1 + second_weight * s2` over the item's
//!   two best scores (just `s1` with a single contribution);
//! - `rrf = sum(1 / (rrf_k + rank))` with 1-based ranks;
//! - `ensemble_score = weighted_share * weighted_top + rrf_share * rrf`.
//!
//! The output is sorted by `ensemble_score`, ties in first-seen order, and
//! is not truncated.

use std::collections::HashSet;
use std::fmt;

use assessa_core::{
    Candidate, EnsembleConfig, IdentitySet, ScoreField, candidate::descending, sort_by_score,
};

/// Strategy variants run by the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnsembleStrategy {
    /// The standard path with rule-based reranking.
    Hybrid,
    /// Pure vector similarity.
    Semantic,
    /// Keyword-only scoring over a broad vector pool.
    KeywordOnly,
    /// Similarity in the alternate embedding space.
    AlternateSpace,
    /// Hybrid results within the duration tolerance.
    DurationFiltered,
}

impl EnsembleStrategy {
    /// Every variant, in run order.
    pub const ALL: [EnsembleStrategy; 5] = [
        Self::Hybrid,
        Self::Semantic,
        Self::KeywordOnly,
        Self::AlternateSpace,
        Self::DurationFiltered,
    ];

    /// Score field the variant ranks by.
    pub fn score_field(self) -> ScoreField {
        match self {
            Self::Hybrid | Self::DurationFiltered => ScoreField::Combined,
            Self::Semantic | Self::AlternateSpace => ScoreField::Semantic,
            Self::KeywordOnly => ScoreField::Keyword,
        }
    }
}

impl fmt::Display for EnsembleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hybrid => "hybrid",
            Self::Semantic => "semantic",
            Self::KeywordOnly => "keyword-only",
            Self::AlternateSpace => "alternate-space",
            Self::DurationFiltered => "duration-filtered",
        })
    }
}

/// One strategy's ranked output.
#[derive(Debug, Clone)]
pub struct StrategyList {
    /// Strategy that produced the list.
    pub strategy: EnsembleStrategy,
    /// Candidates in rank order.
    pub candidates: Vec<Candidate>,
    /// Score field the candidates are ranked by.
    pub field: ScoreField,
}

impl StrategyList {
    /// A list scored by the strategy's own field.
    pub fn new(strategy: EnsembleStrategy, candidates: Vec<Candidate>) -> Self {
        Self {
            strategy,
            candidates,
            field: strategy.score_field(),
        }
    }
}

struct FusedEntry {
    candidate: Candidate,
    identity: IdentitySet,
    contributions: Vec<(f32, usize)>,
}

impl FusedEntry {
    fn score(&self, config: &EnsembleConfig) -> f32 {
        let mut scores: Vec<f32> = self.contributions.iter().map(|(s, _)| *s).collect();
        scores.sort_by(|a, b| descending(*a, *b));

        let weighted_top = match scores.as_slice() {
            [] => 0.0,
            [only] => *only,
            [first, second, ..] => config.top_weight * first + config.second_weight * second,
        };
        let rrf: f32 = self
            .contributions
            .iter()
            .map(|(_, rank)| 1.0 / (config.rrf_k + *rank as f32))
            .sum();

        config.weighted_share * weighted_top + config.rrf_share * rrf
    }
}

/// Merge strategy lists into one ranking.
pub fn fuse(lists: &[StrategyList], config: &EnsembleConfig) -> Vec<Candidate> {
    let mut entries: Vec<FusedEntry> = Vec::new();

    for list in lists {
        let mut contributed: HashSet<usize> = HashSet::new();
        for (offset, candidate) in list.candidates.iter().enumerate() {
            let identity = candidate.item.identity();
            let index = match entries.iter().position(|e| e.identity.intersects(&identity)) {
                Some(index) => index,
                None => {
                    entries.push(FusedEntry {
                        candidate: candidate.clone(),
                        identity,
                        contributions: Vec::new(),
                    });
                    entries.len() - 1
                }
            };
            if contributed.insert(index) {
                entries[index]
                    .contributions
                    .push((list.field.get(candidate), offset + 1));
            }
        }
    }

    let mut fused: Vec<Candidate> = entries
        .into_iter()
        .map(|entry| {
            let score = entry.score(config);
            let mut candidate = entry.candidate;
            candidate.ensemble_score = score;
            candidate
        })
        .collect();
    sort_by_score(&mut fused, ScoreField::Ensemble);

    log::debug!(
        "Fused {} strategy lists into {} candidates",
        lists.len(),
        fused.len()
    );
    fused
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assessa_core::{CatalogItem, is_sorted_by_score};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn candidate(slug: &str, semantic: f32) -> Candidate {
        let item = CatalogItem::new(
            format!("https://www.shl.com/products/product-catalog/view/{slug}/"),
            slug,
        );
        Candidate::new(0, Arc::new(item), semantic)
    }

    fn semantic_list(strategy: EnsembleStrategy, entries: &[(&str, f32)]) -> StrategyList {
        StrategyList {
            strategy,
            candidates: entries.iter().map(|(s, v)| candidate(s, *v)).collect(),
            field: ScoreField::Semantic,
        }
    }

    #[test]
    fn test_single_list_scores() {
        let config = EnsembleConfig::default();
        let fused = fuse(
            &[semantic_list(EnsembleStrategy::Semantic, &[("a", 0.8), ("b", 0.6)])],
            &config,
        );
        assert_eq!(fused.len(), 2);
        let expected_a = 0.7 * 0.8 + 0.3 * (1.0 / 61.0);
        assert!((fused[0].ensemble_score - expected_a).abs() < 1e-6);
        assert_eq!(fused[0].item.name, "a");
    }

    #[test]
    fn test_two_contributions_blend_top_scores() {
        let config = EnsembleConfig::default();
        let lists = [
            semantic_list(EnsembleStrategy::Semantic, &[("a", 0.5), ("b", 0.9)]),
            semantic_list(EnsembleStrategy::AlternateSpace, &[("a", 0.7)]),
        ];
        let fused = fuse(&lists, &config);
        let a = fused.iter().find(|c| c.item.name == "a").unwrap();
        let weighted = 0.7 * 0.7 + 0.3 * 0.5;
        let rrf = 1.0 / 61.0 + 1.0 / 61.0;
        assert!((a.ensemble_score - (0.7 * weighted + 0.3 * rrf)).abs() < 1e-6);
    }

    #[test]
    fn test_dedupes_by_identity() {
        let mut mirrored = candidate("x", 0.4);
        Arc::make_mut(&mut mirrored.item).canonical_url =
            "https://www.shl.com/solutions/products/product-catalog/view/a/".to_string();
        let lists = [
            semantic_list(EnsembleStrategy::Semantic, &[("a", 0.5)]),
            StrategyList {
                strategy: EnsembleStrategy::AlternateSpace,
                candidates: vec![mirrored],
                field: ScoreField::Semantic,
            },
        ];
        let fused = fuse(&lists, &EnsembleConfig::default());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].item.name, "a");
    }

    #[test]
    fn test_duplicate_within_list_counts_once() {
        let lists = [semantic_list(
            EnsembleStrategy::Semantic,
            &[("a", 0.5), ("a", 0.4)],
        )];
        let fused = fuse(&lists, &EnsembleConfig::default());
        assert_eq!(fused.len(), 1);
        let expected = 0.7 * 0.5 + 0.3 * (1.0 / 61.0);
        assert!((fused[0].ensemble_score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let lists = [
            semantic_list(EnsembleStrategy::Semantic, &[("a", 0.5)]),
            semantic_list(EnsembleStrategy::AlternateSpace, &[("b", 0.5)]),
        ];
        let fused = fuse(&lists, &EnsembleConfig::default());
        assert_eq!(fused[0].item.name, "a");
        assert_eq!(fused[1].item.name, "b");
    }

    #[test]
    fn test_empty_input() {
        assert!(fuse(&[], &EnsembleConfig::default()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_every_listed_item_survives(
            lists in prop::collection::vec(
                prop::collection::vec((0usize..12, 0.0f32..1.0), 0..8),
                1..5,
            )
        ) {
            let strategy_lists: Vec<StrategyList> = lists
                .iter()
                .map(|entries| StrategyList {
                    strategy: EnsembleStrategy::Semantic,
                    candidates: entries
                        .iter()
                        .map(|(slug, score)| candidate(&format!("item-{slug}"), *score))
                        .collect(),
                    field: ScoreField::Semantic,
                })
                .collect();

            let fused = fuse(&strategy_lists, &EnsembleConfig::default());

            let listed: HashSet<String> = lists
                .iter()
                .flatten()
                .map(|(slug, _)| format!("item-{slug}"))
                .collect();
            let survived: HashSet<String> = fused.iter().map(|c| c.item.name.clone()).collect();
            prop_assert_eq!(listed, survived);
            prop_assert!(is_sorted_by_score(&fused, ScoreField::Ensemble));
        }
    }
}
