//! Assessment categories.
//!
//! Catalog records label their categories with free-form strings
//! ("Knowledge & Skills", "Knowledge&Skills", "Biodata"). [`Category`] is the
//! closed set those labels parse into, so category matching never depends on
//! punctuation or spacing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A catalog assessment category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Ability & Aptitude (cognitive, numerical, verbal, inductive).
    Ability,
    /// Biodata & Situational Judgement.
    Biodata,
    /// Competencies.
    Competencies,
    /// Development & 360.
    Development,
    /// Assessment Exercises.
    Exercises,
    /// Knowledge & Skills.
    Knowledge,
    /// Personality & Behavior.
    Personality,
    /// Simulations.
    Simulations,
    /// Any label that matches none of the known categories.
    Other(String),
}

impl Category {
    /// Every known category, in catalog order.
    pub const KNOWN: [Category; 8] = [
        Category::Ability,
        Category::Biodata,
        Category::Competencies,
        Category::Development,
        Category::Exercises,
        Category::Knowledge,
        Category::Personality,
        Category::Simulations,
    ];

    /// Parse a free-form label.
    ///
    /// Matching is keyword based and ignores case and punctuation. Single
    /// letter catalog codes (`K`, `P`, `A`, `B`, `C`, `D`, `E`, `S`) are
    /// accepted too.
    pub fn from_label(label: &str) -> Self {
        let lowered = label.trim().to_lowercase();
        let compact: String = lowered.chars().filter(|c| c.is_alphanumeric()).collect();

        match compact.as_str() {
            "a" => return Self::Ability,
            "b" => return Self::Biodata,
            "c" => return Self::Competencies,
            "d" => return Self::Development,
            "e" => return Self::Exercises,
            "k" => return Self::Knowledge,
            "p" => return Self::Personality,
            "s" => return Self::Simulations,
            _ => {}
        }

        let has = |needle: &str| compact.contains(needle);
        if has("knowledge") || has("skill") {
            Self::Knowledge
        } else if has("personality") || has("behavio") {
            Self::Personality
        } else if has("biodata") || has("situational") {
            Self::Biodata
        } else if has("ability") || has("aptitude") || has("cognitive") {
            Self::Ability
        } else if has("competenc") {
            Self::Competencies
        } else if has("development") || has("360") {
            Self::Development
        } else if has("exercise") {
            Self::Exercises
        } else if has("simulation") {
            Self::Simulations
        } else {
            Self::Other(label.trim().to_string())
        }
    }

    /// The canonical display label.
    pub fn label(&self) -> &str {
        match self {
            Self::Ability => "Ability & Aptitude",
            Self::Biodata => "Biodata & Situational Judgement",
            Self::Competencies => "Competencies",
            Self::Development => "Development & 360",
            Self::Exercises => "Assessment Exercises",
            Self::Knowledge => "Knowledge & Skills",
            Self::Personality => "Personality & Behavior",
            Self::Simulations => "Simulations",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_variants() {
        assert_eq!(Category::from_label("Knowledge & Skills"), Category::Knowledge);
        assert_eq!(Category::from_label("Knowledge&Skills"), Category::Knowledge);
        assert_eq!(Category::from_label("knowledge and skills"), Category::Knowledge);
        assert_eq!(Category::from_label("Biodata"), Category::Biodata);
        assert_eq!(
            Category::from_label("Biodata & Situational Judgement"),
            Category::Biodata
        );
        assert_eq!(Category::from_label("Personality"), Category::Personality);
        assert_eq!(Category::from_label("Personality & Behaviour"), Category::Personality);
        assert_eq!(Category::from_label("Ability & Aptitude"), Category::Ability);
        assert_eq!(Category::from_label("Development & 360"), Category::Development);
        assert_eq!(Category::from_label("Assessment Exercises"), Category::Exercises);
    }

    #[test]
    fn test_from_label_codes() {
        assert_eq!(Category::from_label("K"), Category::Knowledge);
        assert_eq!(Category::from_label(" p "), Category::Personality);
    }

    #[test]
    fn test_unknown_label_preserved() {
        assert_eq!(
            Category::from_label(" Language Fluency "),
            Category::Other("Language Fluency".to_string())
        );
    }

    #[test]
    fn test_label_round_trips_through_parser() {
        for category in Category::KNOWN {
            assert_eq!(Category::from_label(category.label()), category);
        }
    }

    #[test]
    fn test_serde_as_label() {
        let json = serde_json::to_string(&Category::Knowledge).unwrap();
        assert_eq!(json, "\"Knowledge & Skills\"");
        let parsed: Category = serde_json::from_str("\"Knowledge&Skills\"").unwrap();
        assert_eq!(parsed, Category::Knowledge);
    }
}
