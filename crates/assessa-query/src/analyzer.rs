//! Query understanding.
//!
//! [`QueryAnalyzer`] turns free text (a one-line request or a pasted job
//! description) into [`QuerySignals`], and builds the expanded text that is
//! embedded for vector retrieval.
//!
//! # Algorithm
//!
//! 1. Normalize: collapse whitespace, lowercase, fold "java script"
//! 2. Duration: first matching pattern in priority order (see [`crate::duration`])
//! 3. Skills: every synonym entry with a trigger term present contributes
//!    its full term set
//! 4. Roles: every role family with a keyword present
//! 5. Categories: keyword cues, plus the broad battery for consultant and
//!    professional roles
//! 6. Seniority and remote cues
//!
//! All matching is on whole words. The analyzer holds no state and is
//! deterministic.

use std::collections::BTreeSet;

use assessa_core::{QuerySignals, Seniority};

use crate::duration::extract_duration;
use crate::lexicon::{
    BROAD_BATTERY_CATEGORIES, BROAD_BATTERY_ROLES, CATEGORY_CUES, ENTRY_CUES, REMOTE_CUES,
    ROLE_FAMILIES, SENIOR_CUES, SYNONYMS,
};
use crate::text::{Tokens, normalize_text};

/// Maximum synonym terms appended to the expanded query.
pub const MAX_SKILL_EXPANSIONS: usize = 8;
/// Maximum role families appended to the expanded query.
pub const MAX_ROLE_EXPANSIONS: usize = 5;
/// Maximum seniority phrases appended to the expanded query.
pub const MAX_LEVEL_EXPANSIONS: usize = 3;

/// Extracts structured signals from query text.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAnalyzer;

impl QueryAnalyzer {
    /// Create an analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Derive the signals for `query`.
    pub fn analyze(&self, query: &str) -> QuerySignals {
        let normalized_text = normalize_text(query);
        let tokens = Tokens::new(&normalized_text);

        let skill_tokens: BTreeSet<String> = self
            .ordered_skills(&tokens)
            .into_iter()
            .map(str::to_string)
            .collect();

        let role_tokens: BTreeSet<String> = self
            .ordered_roles(&tokens)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut preferred_categories = BTreeSet::new();
        for (cues, category) in CATEGORY_CUES {
            if tokens.contains_any(cues) {
                preferred_categories.insert(category.clone());
            }
        }
        if BROAD_BATTERY_ROLES.iter().any(|r| role_tokens.contains(*r)) {
            preferred_categories.extend(BROAD_BATTERY_CATEGORIES.iter().cloned());
        }

        let signals = QuerySignals {
            raw_text: query.to_string(),
            duration_bound: extract_duration(&normalized_text),
            skill_tokens,
            role_tokens,
            preferred_categories,
            seniority: Seniority {
                entry: tokens.contains_any(ENTRY_CUES),
                senior: tokens.contains_any(SENIOR_CUES),
            },
            mentions_remote: tokens.contains_any(REMOTE_CUES),
            normalized_text,
        };

        log::debug!(
            "Analyzed query: duration={:?} skills={} roles={:?} categories={:?}",
            signals.duration_bound,
            signals.skill_tokens.len(),
            signals.role_tokens,
            signals.preferred_categories
        );
        signals
    }

    /// Text to embed for retrieval.
    ///
    /// The normalized query, followed by up to eight synonym terms, up to
    /// five role families and up to three seniority phrases that the query
    /// does not already contain, in table order.
    pub fn expand(&self, signals: &QuerySignals) -> String {
        let tokens = Tokens::new(&signals.normalized_text);
        let mut parts: Vec<&str> = vec![signals.normalized_text.as_str()];

        parts.extend(
            self.ordered_skills(&tokens)
                .into_iter()
                .filter(|term| !tokens.contains_phrase(term))
                .take(MAX_SKILL_EXPANSIONS),
        );

        parts.extend(
            self.ordered_roles(&tokens)
                .into_iter()
                .filter(|role| !tokens.contains_phrase(role))
                .take(MAX_ROLE_EXPANSIONS),
        );

        let mut level_terms: Vec<&str> = Vec::new();
        if tokens.contains_any(&["entry", "graduate"]) {
            level_terms.extend(["entry level", "junior", "graduate"]);
        }
        if tokens.contains_any(&["senior", "experienced"]) {
            level_terms.extend(["senior", "experienced", "professional"]);
        }
        if tokens.contains_phrase("manager") {
            level_terms.push("management");
        }
        if tokens.contains_phrase("analyst") {
            level_terms.push("data analysis");
        }
        parts.extend(
            level_terms
                .into_iter()
                .take(MAX_LEVEL_EXPANSIONS)
                .filter(|term| !tokens.contains_phrase(term)),
        );

        // Terms appear once even when several entries share them.
        let mut seen = BTreeSet::new();
        parts.retain(|part| seen.insert(*part));
        parts.join(" ")
    }

    fn ordered_skills(&self, tokens: &Tokens) -> Vec<&'static str> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for entry in SYNONYMS {
            if tokens.contains_any(entry.terms) {
                log::trace!("Synonym entry '{}' triggered", entry.key);
                for term in entry.terms {
                    if seen.insert(*term) {
                        ordered.push(*term);
                    }
                }
            }
        }
        ordered
    }

    fn ordered_roles(&self, tokens: &Tokens) -> Vec<&'static str> {
        ROLE_FAMILIES
            .iter()
            .filter(|family| tokens.contains_any(family.keywords))
            .map(|family| family.name)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assessa_core::Category;

    fn analyze(q: &str) -> QuerySignals {
        QueryAnalyzer::new().analyze(q)
    }

    #[test]
    fn test_java_developer_query() {
        let s = analyze("Java developer, 40 minutes");
        assert_eq!(s.normalized_text, "java developer, 40 minutes");
        assert_eq!(s.duration_bound, Some(40));
        assert!(s.skill_tokens.contains("java"));
        assert!(s.skill_tokens.contains("core java"));
        assert!(s.skill_tokens.contains("programmer"));
        assert!(!s.skill_tokens.contains("javascript"));
        assert_eq!(s.role_tokens.iter().collect::<Vec<_>>(), vec!["developer"]);
        assert!(s.preferred_categories.is_empty());
    }

    #[test]
    fn test_full_expansion_set_selected() {
        let s = analyze("hiring for spring services");
        for term in ["java", "j2ee", "hibernate", "automata"] {
            assert!(s.skill_tokens.contains(term), "missing {term}");
        }
    }

    #[test]
    fn test_entry_level_sales() {
        let s = analyze("entry level sales role");
        assert!(s.skill_tokens.contains("sales"));
        assert!(s.skill_tokens.contains("entry level sales"));
        assert!(s.skill_tokens.contains("junior"));
        assert!(s.role_tokens.contains("sales"));
        assert!(s.seniority.entry);
        assert!(!s.seniority.senior);
    }

    #[test]
    fn test_category_inference() {
        let s = analyze("personality and numerical reasoning test");
        assert!(s.preferred_categories.contains(&Category::Personality));
        assert!(s.preferred_categories.contains(&Category::Ability));
        assert!(!s.preferred_categories.contains(&Category::Knowledge));
    }

    #[test]
    fn test_consultant_implies_broad_battery() {
        let s = analyze("Hiring a consultant");
        assert!(s.role_tokens.contains("consultant"));
        for category in [Category::Personality, Category::Ability, Category::Competencies] {
            assert!(s.preferred_categories.contains(&category));
        }
    }

    #[test]
    fn test_multiple_role_families() {
        let s = analyze("sales manager with leadership skills");
        assert!(s.role_tokens.contains("sales"));
        assert!(s.role_tokens.contains("manager"));
        assert!(s.role_tokens.contains("executive"));
        assert!(s.preferred_categories.contains(&Category::Knowledge));
    }

    #[test]
    fn test_remote_and_senior_cues() {
        let s = analyze("Senior engineer, remote, 5+ years");
        assert!(s.mentions_remote);
        assert!(s.seniority.senior);
    }

    #[test]
    fn test_javascript_folding() {
        let s = analyze("Java Script developer");
        assert!(s.skill_tokens.contains("javascript"));
        assert!(!s.skill_tokens.contains("core java"));
    }

    #[test]
    fn test_expand_appends_missing_terms() {
        let analyzer = QueryAnalyzer::new();
        let s = analyzer.analyze("Java developer");
        let expanded = analyzer.expand(&s);
        assert!(expanded.starts_with("java developer "));
        // First missing java terms, capped at eight skill terms.
        assert!(expanded.contains("j2ee"));
        assert!(expanded.contains("automata"));
        assert!(!expanded.contains("software engineer"));
    }

    #[test]
    fn test_expand_levels() {
        let analyzer = QueryAnalyzer::new();
        let s = analyzer.analyze("graduate analyst");
        let expanded = analyzer.expand(&s);
        assert!(expanded.contains("entry level"));
        assert!(expanded.contains("junior"));
    }

    #[test]
    fn test_expand_without_signals_is_identity() {
        let analyzer = QueryAnalyzer::new();
        let s = analyzer.analyze("  something   unrelated ");
        assert_eq!(analyzer.expand(&s), "something unrelated");
    }

    #[test]
    fn test_deterministic() {
        let text = "Need a Python and SQL data analyst, 30-45 minutes, remote";
        assert_eq!(analyze(text), analyze(text));
        let analyzer = QueryAnalyzer::new();
        assert_eq!(analyzer.expand(&analyze(text)), analyzer.expand(&analyze(text)));
        assert_eq!(analyze(text).duration_bound, Some(45));
    }
}
