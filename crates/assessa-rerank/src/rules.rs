//! Rule-based reranking.
//!
//! The deterministic last resort of the rerank chain. Each candidate earns
//! additive bonuses for what its name and metadata say about the query:
//!
//! | Evidence                                   | Bonus (default) |
//! |--------------------------------------------|-----------------|
//! | skill token in name                        | 0.30 each       |
//! | role family in name                        | 0.25 each       |
//! | duration within tolerance of the bound     | 0.15            |
//! | preferred category carried                 | 0.10 each       |
//! | entry cue and entry/junior/level in name   | 0.10            |
//! | senior cue and senior/advanced/professional in name | 0.10   |
//! | remote cue and remote support              | 0.05            |
//!
//! The bonus is stored in `rerank_score` and added to `combined_score`.

use assessa_core::{
    Candidate, CatalogItem, FilterConfig, QuerySignals, RuleBonuses, ScoreField, sort_by_score,
};
use assessa_query::Tokens;
use assessa_query::lexicon::{ENTRY_NAME_MARKERS, SENIOR_NAME_MARKERS};

/// Additive, never-failing reranker.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedReranker {
    bonuses: RuleBonuses,
    filter: FilterConfig,
}

impl RuleBasedReranker {
    /// Create a reranker. The duration tolerance is read from `filter` so the
    /// bonus and the soft filter agree on what "fits" means.
    pub fn new(bonuses: RuleBonuses, filter: FilterConfig) -> Self {
        Self { bonuses, filter }
    }

    /// Bonus earned by `item`.
    pub fn bonus(&self, signals: &QuerySignals, item: &CatalogItem) -> f32 {
        let name = Tokens::new(&item.name);
        let mut bonus = 0.0;

        let skills = signals
            .skill_tokens
            .iter()
            .filter(|s| name.contains_phrase(s))
            .count();
        bonus += skills as f32 * self.bonuses.skill_in_name;

        let roles = signals
            .role_tokens
            .iter()
            .filter(|r| name.contains_phrase(r))
            .count();
        bonus += roles as f32 * self.bonuses.role_in_name;

        if let (Some(bound), Some(minutes)) = (signals.duration_bound, item.duration_minutes)
            && minutes as f32 <= self.filter.tolerated_duration(bound)
        {
            bonus += self.bonuses.duration_fit;
        }

        bonus += item.category_overlap(&signals.preferred_categories) as f32
            * self.bonuses.category_match;

        if signals.seniority.entry && name.contains_any(ENTRY_NAME_MARKERS) {
            bonus += self.bonuses.entry_alignment;
        }
        if signals.seniority.senior && name.contains_any(SENIOR_NAME_MARKERS) {
            bonus += self.bonuses.senior_alignment;
        }
        if signals.mentions_remote && item.supports_remote {
            bonus += self.bonuses.remote;
        }

        bonus
    }

    /// Apply bonuses and sort by combined score. Never fails.
    pub fn rerank(&self, signals: &QuerySignals, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        for candidate in &mut candidates {
            let bonus = self.bonus(signals, &candidate.item);
            candidate.rerank_score = bonus;
            candidate.combined_score += bonus;
        }
        sort_by_score(&mut candidates, ScoreField::Combined);
        candidates
    }
}
