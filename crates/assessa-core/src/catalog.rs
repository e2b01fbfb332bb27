//! Catalog item records.
//!
//! [`CatalogItem`] is the unit of retrieval. Items are produced by the
//! catalog acquisition collaborator as a JSON array; the deserializer accepts
//! that record shape directly:
//!
//! | Field | Accepted forms |
//! |-------|----------------|
//! | `canonical_url` | also `url` |
//! | `duration_minutes` | also `duration`; `0` or `null` means unknown |
//! | `supports_remote` | also `remote_support`; bool or `"Yes"`/`"No"` |
//! | `supports_adaptive` | also `adaptive_support`; bool or `"Yes"`/`"No"` |
//! | `categories` | also `test_type`; a label or a list of labels |

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::category::Category;
use crate::identity::IdentitySet;

/// One assessment product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Primary product URL.
    #[serde(alias = "url")]
    pub canonical_url: String,

    /// Other URLs under which the product is published.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub alternate_urls: BTreeSet<String>,

    /// Product name.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Typical completion time in minutes, when known.
    #[serde(
        default,
        alias = "duration",
        deserialize_with = "deserialize_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_minutes: Option<u32>,

    /// Whether the assessment can be taken remotely.
    #[serde(default, alias = "remote_support", deserialize_with = "deserialize_flag")]
    pub supports_remote: bool,

    /// Whether the assessment adapts to the candidate (IRT).
    #[serde(default, alias = "adaptive_support", deserialize_with = "deserialize_flag")]
    pub supports_adaptive: bool,

    /// Categories the assessment belongs to.
    #[serde(default, alias = "test_type", deserialize_with = "deserialize_categories")]
    pub categories: BTreeSet<Category>,
}

impl CatalogItem {
    /// Create an item with the required fields; everything else defaults.
    pub fn new(canonical_url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            alternate_urls: BTreeSet::new(),
            name: name.into(),
            description: String::new(),
            duration_minutes: None,
            supports_remote: false,
            supports_adaptive: false,
            categories: BTreeSet::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the duration in minutes.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Add a category.
    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.categories.insert(category.into());
        self
    }

    /// Add an alternate URL.
    pub fn with_alternate_url(mut self, url: impl Into<String>) -> Self {
        self.alternate_urls.insert(url.into());
        self
    }

    /// Set remote support.
    pub fn with_remote(mut self, supported: bool) -> Self {
        self.supports_remote = supported;
        self
    }

    /// Set adaptive support.
    pub fn with_adaptive(mut self, supported: bool) -> Self {
        self.supports_adaptive = supported;
        self
    }

    /// Identity set covering the canonical and alternate URLs.
    pub fn identity(&self) -> IdentitySet {
        IdentitySet::new(
            &self.canonical_url,
            self.alternate_urls.iter().map(String::as_str),
        )
    }

    /// Whether the item carries any of the given categories.
    pub fn has_any_category(&self, wanted: &BTreeSet<Category>) -> bool {
        wanted.iter().any(|c| self.categories.contains(c))
    }

    /// Number of the given categories the item carries.
    pub fn category_overlap(&self, wanted: &BTreeSet<Category>) -> usize {
        wanted.iter().filter(|c| self.categories.contains(*c)).count()
    }
}

impl AsRef<CatalogItem> for CatalogItem {
    fn as_ref(&self) -> &CatalogItem {
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationRepr {
    Number(f64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<DurationRepr> = Option::deserialize(deserializer)?;
    let minutes = match raw {
        None => None,
        Some(DurationRepr::Number(n)) if n.is_finite() && n >= 1.0 => Some(n.round() as u32),
        Some(DurationRepr::Number(_)) => None,
        Some(DurationRepr::Text(text)) => text
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|m| *m > 0),
    };
    Ok(minutes)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<FlagRepr> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => false,
        Some(FlagRepr::Bool(b)) => b,
        Some(FlagRepr::Text(text)) => {
            matches!(text.trim().to_lowercase().as_str(), "yes" | "y" | "true" | "1")
        }
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoriesRepr {
    One(String),
    Many(Vec<String>),
}

fn deserialize_categories<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeSet<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<CategoriesRepr> = Option::deserialize(deserializer)?;
    let labels = match raw {
        None => Vec::new(),
        Some(CategoriesRepr::One(label)) => label.split(',').map(str::to_string).collect(),
        Some(CategoriesRepr::Many(labels)) => labels,
    };
    Ok(labels
        .iter()
        .filter(|label| !label.trim().is_empty())
        .map(|label| Category::from_label(label))
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
