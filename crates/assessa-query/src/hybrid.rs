//! Hybrid semantic + lexical scoring.
//!
//! Vector similarity alone misses hard requirements that surface as exact
//! words ("Java", "sales"), and lexical matching alone misses paraphrase. The
//! hybrid scorer adds weighted lexical and metadata evidence on top of the
//! cosine similarity of every retrieved candidate:
//!
//! ```text
//! keyword  = Σ skill in name (else description)
//!          + Σ role family in name (else description)
//!          + Σ skill in both query and name
//!          + Σ preferred category carried
//!          + shared non-stopword query/name tokens × overlap weight
//! combined = semantic + keyword
//! ```
//!
//! Weights come from [`ScoringWeights`]; the keyword-only preset reuses the
//! same evidence with different weights.

use std::sync::Arc;

use assessa_core::{Candidate, CatalogItem, QuerySignals, ScoreField, ScoringWeights, sort_by_score};
use assessa_vector::{Corpus, VectorHit};

use crate::text::Tokens;

/// Per-item lexical evidence, computed once and weighted by the scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexicalEvidence {
    /// Skill tokens found in the name.
    pub skills_in_name: usize,
    /// Skill tokens found only in the description.
    pub skills_in_description: usize,
    /// Role families found in the name.
    pub roles_in_name: usize,
    /// Role families found only in the description.
    pub roles_in_description: usize,
    /// Skill tokens present in both the query text and the name.
    pub exact_skills: usize,
    /// Preferred categories the item carries.
    pub categories: usize,
    /// Shared non-stopword query/name tokens.
    pub overlap: usize,
}

impl LexicalEvidence {
    /// Gather evidence for `item` against `signals`.
    ///
    /// `query_tokens` is the text the query was embedded with (usually the
    /// expanded query).
    pub fn gather(signals: &QuerySignals, query_tokens: &Tokens, item: &CatalogItem) -> Self {
        let name = Tokens::new(&item.name);
        let description = Tokens::new(&item.description);
        let mut evidence = Self::default();

        for skill in &signals.skill_tokens {
            if name.contains_phrase(skill) {
                evidence.skills_in_name += 1;
                if query_tokens.contains_phrase(skill) {
                    evidence.exact_skills += 1;
                }
            } else if description.contains_phrase(skill) {
                evidence.skills_in_description += 1;
            }
        }

        for role in &signals.role_tokens {
            if name.contains_phrase(role) {
                evidence.roles_in_name += 1;
            } else if description.contains_phrase(role) {
                evidence.roles_in_description += 1;
            }
        }

        evidence.categories = item.category_overlap(&signals.preferred_categories);

        let query_words = query_tokens.content_words();
        evidence.overlap = name.content_words().intersection(&query_words).count();

        evidence
    }

    /// Weighted sum of the evidence.
    pub fn score(&self, weights: &ScoringWeights) -> f32 {
        self.skills_in_name as f32 * weights.skill_in_name
            + self.skills_in_description as f32 * weights.skill_in_description
            + self.roles_in_name as f32 * weights.role_in_name
            + self.roles_in_description as f32 * weights.role_in_description
            + self.exact_skills as f32 * weights.exact_skill
            + self.categories as f32 * weights.category_match
            + self.overlap as f32 * weights.token_overlap
    }

    /// Whether any skill or role evidence was found.
    pub fn has_term_evidence(&self) -> bool {
        self.skills_in_name
            + self.skills_in_description
            + self.roles_in_name
            + self.roles_in_description
            > 0
    }
}

/// Blends vector similarity with weighted lexical evidence.
#[derive(Debug, Clone, Default)]
pub struct HybridScorer {
    weights: ScoringWeights,
}

impl HybridScorer {
    /// Create a scorer with `weights`.
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// The scorer's weights.
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Keyword score of one item.
    pub fn keyword_score(
        &self,
        signals: &QuerySignals,
        query_tokens: &Tokens,
        item: &CatalogItem,
    ) -> f32 {
        LexicalEvidence::gather(signals, query_tokens, item).score(&self.weights)
    }

    /// Score vector hits and return candidates sorted by combined score.
    ///
    /// `query_text` is the text that was embedded. Hits whose position is
    /// outside the corpus are skipped.
    pub fn score(
        &self,
        signals: &QuerySignals,
        query_text: &str,
        hits: &[VectorHit],
        corpus: &Corpus,
    ) -> Vec<Candidate> {
        let query_tokens = Tokens::new(query_text);
        let mut candidates: Vec<Candidate> = hits
            .iter()
            .filter_map(|hit| {
                let item = corpus.item(hit.position)?;
                Some(self.candidate(signals, &query_tokens, hit, Arc::clone(item)))
            })
            .collect();
        sort_by_score(&mut candidates, ScoreField::Combined);
        candidates
    }

    /// Keyword-only scoring: hits with no skill or role evidence are
    /// dropped and the remainder are sorted by keyword score.
    pub fn score_keyword_only(
        &self,
        signals: &QuerySignals,
        query_text: &str,
        hits: &[VectorHit],
        corpus: &Corpus,
    ) -> Vec<Candidate> {
        let query_tokens = Tokens::new(query_text);
        let mut candidates: Vec<Candidate> = hits
            .iter()
            .filter_map(|hit| {
                let item = corpus.item(hit.position)?;
                let evidence = LexicalEvidence::gather(signals, &query_tokens, item);
                let keyword_score = evidence.score(&self.weights);
                if !evidence.has_term_evidence() || keyword_score <= 0.0 {
                    return None;
                }
                let mut candidate = Candidate::new(hit.position, Arc::clone(item), hit.score);
                candidate.keyword_score = keyword_score;
                candidate.combined_score = keyword_score;
                Some(candidate)
            })
            .collect();
        sort_by_score(&mut candidates, ScoreField::Keyword);
        candidates
    }

    fn candidate(
        &self,
        signals: &QuerySignals,
        query_tokens: &Tokens,
        hit: &VectorHit,
        item: Arc<CatalogItem>,
    ) -> Candidate {
        let keyword_score = self.keyword_score(signals, query_tokens, &item);
        let mut candidate = Candidate::new(hit.position, item, hit.score);
        candidate.keyword_score = keyword_score;
        candidate.combined_score = hit.score + keyword_score;
        candidate
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analyzer::QueryAnalyzer;
    use assessa_core::{Category, is_sorted_by_score};
    use assessa_vector::VectorIndex;

    fn corpus() -> Corpus {
        let items = vec![
            Arc::new(
                CatalogItem::new("https://x.com/view/core-java-advanced", "Core Java Advanced")
                    .with_description("Java programming knowledge test")
                    .with_duration(40)
                    .with_category(Category::Knowledge),
            ),
            Arc::new(
                CatalogItem::new("https://x.com/view/entry-level-sales", "Entry Level Sales")
                    .with_description("Sales aptitude for new graduates")
                    .with_duration(20)
                    .with_category(Category::Biodata),
            ),
            Arc::new(
                CatalogItem::new("https://x.com/view/opq", "OPQ Personality")
                    .with_description("Occupational personality questionnaire")
                    .with_duration(25)
                    .with_category(Category::Personality),
            ),
        ];
        let index = VectorIndex::from_vectors(1, vec![vec![1.0]; 3]).unwrap();
        Corpus::new(items, index).unwrap()
    }

    fn hits(n: usize) -> Vec<VectorHit> {
        (0..n).map(|position| VectorHit { position, score: 1.0 }).collect()
    }

    #[test]
    fn test_evidence_counts() {
        let signals = QueryAnalyzer::new().analyze("Java developer, 40 minutes");
        let corpus = corpus();
        let tokens = Tokens::new(&signals.normalized_text);
        let evidence = LexicalEvidence::gather(&signals, &tokens, corpus.item(0).unwrap());

        // "java" and "core java" in the name.
        assert_eq!(evidence.skills_in_name, 2);
        // Only "java" also appears in the query text.
        assert_eq!(evidence.exact_skills, 1);
        assert_eq!(evidence.roles_in_name, 0);
        // Shared word: "java".
        assert_eq!(evidence.overlap, 1);

        let weights = ScoringWeights::default();
        assert!((evidence.score(&weights) - (0.8 + 0.2 + 0.15)).abs() < 1e-5);
    }

    #[test]
    fn test_description_only_counts_when_not_in_name() {
        let signals = QuerySignals::from_text("q").with_skill("programming");
        let corpus = corpus();
        let evidence =
            LexicalEvidence::gather(&signals, &Tokens::new("q"), corpus.item(0).unwrap());
        assert_eq!(evidence.skills_in_name, 0);
        assert_eq!(evidence.skills_in_description, 1);
    }

    #[test]
    fn test_category_evidence() {
        let signals = QuerySignals::from_text("q").with_category(Category::Personality);
        let corpus = corpus();
        let scorer = HybridScorer::default();
        let score = scorer.keyword_score(&signals, &Tokens::new("q"), corpus.item(2).unwrap());
        assert!((score - 0.20).abs() < 1e-5);
    }

    #[test]
    fn test_score_sorts_by_combined() {
        let signals = QueryAnalyzer::new().analyze("entry level sales role");
        let scorer = HybridScorer::default();
        let candidates = scorer.score(&signals, &signals.normalized_text, &hits(3), &corpus());

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].item.name, "Entry Level Sales");
        assert!(is_sorted_by_score(&candidates, ScoreField::Combined));
        for c in &candidates {
            assert!((c.combined_score - (c.semantic_score + c.keyword_score)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_out_of_range_hits_skipped() {
        let signals = QuerySignals::from_text("anything");
        let mut all = hits(3);
        all.push(VectorHit { position: 99, score: 0.9 });
        let candidates = HybridScorer::default().score(&signals, "anything", &all, &corpus());
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_ties_keep_hit_order() {
        let signals = QuerySignals::from_text("nothing matches here");
        let candidates =
            HybridScorer::default().score(&signals, "nothing matches here", &hits(3), &corpus());
        let order: Vec<usize> = candidates.iter().map(|c| c.position).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_keyword_only_drops_zero_evidence() {
        let signals = QueryAnalyzer::new().analyze("Java developer");
        let scorer = HybridScorer::new(ScoringWeights::keyword_only());
        let candidates =
            scorer.score_keyword_only(&signals, &signals.normalized_text, &hits(3), &corpus());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].item.name, "Core Java Advanced");
        assert_eq!(candidates[0].combined_score, candidates[0].keyword_score);
    }
}
