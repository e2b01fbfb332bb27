//! Structured signals extracted from a hiring query.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Seniority cues found in a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seniority {
    /// Entry-level cues (entry, graduate, junior, 0-2 years).
    pub entry: bool,
    /// Senior cues (senior, experienced, 5+ years).
    pub senior: bool,
}

/// Everything downstream stages need to know about a query.
///
/// Derived once per query by query understanding and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySignals {
    /// The query exactly as received.
    pub raw_text: String,
    /// Lowercased, whitespace-collapsed query text.
    pub normalized_text: String,
    /// Upper bound on assessment length in minutes, if stated.
    pub duration_bound: Option<u32>,
    /// Detected skills plus their synonym expansions.
    pub skill_tokens: BTreeSet<String>,
    /// Detected role families.
    pub role_tokens: BTreeSet<String>,
    /// Categories the query asks for, explicitly or by implication.
    pub preferred_categories: BTreeSet<Category>,
    /// Seniority cues.
    pub seniority: Seniority,
    /// Whether the query mentions remote testing.
    pub mentions_remote: bool,
}

impl QuerySignals {
    /// Signals carrying only the query text.
    pub fn from_text(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = raw_text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self {
            raw_text,
            normalized_text,
            ..Self::default()
        }
    }

    /// Set the duration bound.
    pub fn with_duration_bound(mut self, minutes: u32) -> Self {
        self.duration_bound = Some(minutes);
        self
    }

    /// Add a skill token.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill_tokens.insert(skill.into());
        self
    }

    /// Add a role family.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role_tokens.insert(role.into());
        self
    }

    /// Add a preferred category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.preferred_categories.insert(category);
        self
    }

    /// Whether the query states category preferences.
    pub fn has_category_preferences(&self) -> bool {
        !self.preferred_categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_normalizes() {
        let signals = QuerySignals::from_text("  Java   Developer\n40 MINUTES ");
        assert_eq!(signals.normalized_text, "java developer 40 minutes");
        assert_eq!(signals.raw_text, "  Java   Developer\n40 MINUTES ");
        assert!(signals.duration_bound.is_none());
    }

    #[test]
    fn test_builders() {
        let signals = QuerySignals::from_text("q")
            .with_duration_bound(30)
            .with_skill("java")
            .with_role("developer")
            .with_category(Category::Knowledge);
        assert_eq!(signals.duration_bound, Some(30));
        assert!(signals.skill_tokens.contains("java"));
        assert!(signals.role_tokens.contains("developer"));
        assert!(signals.has_category_preferences());
    }
}
