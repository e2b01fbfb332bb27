//! Soft constraint filtering.
//!
//! Duration and category preferences never remove a candidate; they only
//! scale its combined score down so a near miss can still surface when
//! nothing better exists.

use assessa_core::{Candidate, FilterConfig, QuerySignals, ScoreField, sort_by_score};

/// Applies duration and category penalties to combined scores.
#[derive(Debug, Clone, Default)]
pub struct SoftFilter {
    config: FilterConfig,
}

impl SoftFilter {
    /// Create a filter with `config`.
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Penalty multiplier for one candidate.
    ///
    /// Items longer than the tolerated duration get the duration penalty;
    /// items matching none of the preferred categories get the category
    /// penalty. Unknown durations are never penalized.
    pub fn penalty(&self, signals: &QuerySignals, candidate: &Candidate) -> f32 {
        let mut factor = 1.0;

        if let (Some(bound), Some(minutes)) = (signals.duration_bound, candidate.item.duration_minutes)
            && minutes as f32 > self.config.tolerated_duration(bound)
        {
            factor *= self.config.duration_penalty;
        }

        if signals.has_category_preferences()
            && !candidate.item.has_any_category(&signals.preferred_categories)
        {
            factor *= self.config.category_penalty;
        }

        factor
    }

    /// Penalize and re-sort `candidates`. The count never changes.
    pub fn apply(&self, signals: &QuerySignals, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if signals.duration_bound.is_none() && !signals.has_category_preferences() {
            return candidates;
        }

        let mut penalized = 0usize;
        for candidate in &mut candidates {
            let factor = self.penalty(signals, candidate);
            if factor < 1.0 {
                candidate.combined_score *= factor;
                penalized += 1;
            }
        }
        log::debug!("Soft filter penalized {penalized} of {} candidates", candidates.len());

        sort_by_score(&mut candidates, ScoreField::Combined);
        candidates
    }
}

// ============================================================================
// Tests
// ============================================================================
