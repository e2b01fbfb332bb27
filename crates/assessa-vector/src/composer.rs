//! Document text composition.
//!
//! The composer decides what text represents a catalog item in embedding
//! space. Embedding only the name loses the description; embedding raw JSON
//! wastes tokens on field names. [`CatalogComposer`] joins the informative
//! fields into one plain-text document.

use assessa_core::CatalogItem;
use assessa_core::identity::normalize;

/// Trait for turning a catalog item into embeddable text.
pub trait DocumentComposer: Send + Sync {
    /// Compose the document text for `item`.
    fn compose(&self, item: &CatalogItem) -> String;

    /// Name of this composer for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Default composer.
///
/// Produces `name: description: slug words: N minutes: categories: remote
/// testing supported: adaptive IRT assessment`, omitting absent parts.
#[derive(Debug, Clone, Default)]
pub struct CatalogComposer;

impl DocumentComposer for CatalogComposer {
    fn compose(&self, item: &CatalogItem) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(7);

        parts.push(item.name.trim().to_string());

        let description = item.description.trim();
        if !description.is_empty() {
            parts.push(description.to_string());
        }

        let slug_words = readable_slug(&item.canonical_url);
        if !slug_words.is_empty() && !slug_words.eq_ignore_ascii_case(item.name.trim()) {
            parts.push(slug_words);
        }

        if let Some(minutes) = item.duration_minutes {
            parts.push(format!("{minutes} minutes"));
        }

        if !item.categories.is_empty() {
            let labels: Vec<&str> = item.categories.iter().map(|c| c.label()).collect();
            parts.push(labels.join(", "));
        }

        if item.supports_remote {
            parts.push("remote testing supported".to_string());
        }
        if item.supports_adaptive {
            parts.push("adaptive IRT assessment".to_string());
        }

        parts.join(": ")
    }

    fn name(&self) -> &str {
        "catalog"
    }
}

/// Slug of a URL with separators turned into spaces.
fn readable_slug(url: &str) -> String {
    normalize(url)
        .split(|c: char| c == '-' || c == '_' || c == '/')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A composer that embeds only the item name.
#[derive(Debug, Clone, Default)]
pub struct NameOnlyComposer;

impl DocumentComposer for NameOnlyComposer {
    fn compose(&self, item: &CatalogItem) -> String {
        item.name.clone()
    }

    fn name(&self) -> &str {
        "name-only"
    }
}
