//! Feature extraction for the learned reranker.
//!
//! Every candidate maps to a fixed-length vector whose order is part of the
//! model artifact's schema ([`FEATURE_NAMES`]). All features are
//! corpus-size independent so a model trained on one catalog snapshot keeps
//! its meaning on the next.

use std::collections::BTreeSet;

use assessa_core::{Candidate, QuerySignals};
use assessa_query::Tokens;

/// Number of features per candidate.
pub const FEATURE_COUNT: usize = 17;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "semantic_score",
    "combined_score",
    "name_keyword_matches",
    "name_keyword_ratio",
    "desc_keyword_matches",
    "desc_keyword_ratio",
    "exact_name_match",
    "duration_match_ratio",
    "duration_diff_hours",
    "category_matches",
    "category_match_ratio",
    "skill_name_matches",
    "role_name_matches",
    "supports_remote",
    "supports_adaptive",
    "name_length",
    "desc_length",
];

/// Query keywords are tokens longer than this many characters.
const KEYWORD_MIN_LEN: usize = 2;
/// An exact name match needs a keyword longer than this.
const EXACT_MATCH_MIN_LEN: usize = 4;

/// Per-query feature extractor.
///
/// Tokenizes the query once and is then applied to every pooled candidate.
#[derive(Debug, Clone)]
pub struct FeatureExtractor<'a> {
    signals: &'a QuerySignals,
    keywords: BTreeSet<String>,
}

impl<'a> FeatureExtractor<'a> {
    /// Prepare an extractor for `signals`.
    pub fn new(signals: &'a QuerySignals) -> Self {
        let tokens = Tokens::new(&signals.normalized_text);
        let keywords = tokens
            .keywords(KEYWORD_MIN_LEN)
            .into_iter()
            .map(str::to_string)
            .collect();
        Self { signals, keywords }
    }

    /// Query keywords in use.
    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Feature vector for one candidate.
    pub fn extract(&self, candidate: &Candidate) -> [f32; FEATURE_COUNT] {
        let item = &candidate.item;
        let name = Tokens::new(&item.name);
        let description = Tokens::new(&item.description);

        let keyword_count = self.keywords.len();
        let ratio = |matches: usize| {
            if keyword_count == 0 {
                0.0
            } else {
                matches as f32 / keyword_count as f32
            }
        };

        let name_matches = self.keywords.iter().filter(|k| name.contains_phrase(k)).count();
        let desc_matches = self
            .keywords
            .iter()
            .filter(|k| description.contains_phrase(k))
            .count();
        let exact_name_match = self
            .keywords
            .iter()
            .any(|k| k.chars().count() > EXACT_MATCH_MIN_LEN && name.contains_phrase(k));

        let (duration_ratio, duration_diff) =
            match (self.signals.duration_bound, item.duration_minutes) {
                (Some(bound), Some(minutes)) if bound > 0 && minutes > 0 => {
                    let (bound, minutes) = (bound as f32, minutes as f32);
                    (bound.min(minutes) / bound.max(minutes), (bound - minutes).abs() / 60.0)
                }
                _ => (0.5, 0.0),
            };

        let preferred = &self.signals.preferred_categories;
        let category_matches = item.category_overlap(preferred);
        let category_ratio = if preferred.is_empty() {
            0.0
        } else {
            category_matches as f32 / preferred.len() as f32
        };

        let skill_matches = self
            .signals
            .skill_tokens
            .iter()
            .filter(|s| name.contains_phrase(s))
            .count();
        let role_matches = self
            .signals
            .role_tokens
            .iter()
            .filter(|r| name.contains_phrase(r))
            .count();

        [
            candidate.semantic_score,
            candidate.combined_score,
            name_matches as f32,
            ratio(name_matches),
            desc_matches as f32,
            ratio(desc_matches),
            flag(exact_name_match),
            duration_ratio,
            duration_diff,
            category_matches as f32,
            category_ratio,
            skill_matches as f32,
            role_matches as f32,
            flag(item.supports_remote),
            flag(item.supports_adaptive),
            item.name.chars().count() as f32 / 100.0,
            item.description.chars().count() as f32 / 500.0,
        ]
    }
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}
