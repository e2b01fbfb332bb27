//! The record returned to callers for each ranked item.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use assessa_core::{Candidate, CatalogItem, Category, IdentitySet};

/// One recommended assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Primary product URL.
    pub canonical_url: String,
    /// Other URLs for the same product.
    #[serde(default)]
    pub alternate_urls: BTreeSet<String>,
    /// Product name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Completion time in minutes, when known.
    pub duration_minutes: Option<u32>,
    /// Remote testing support.
    pub supports_remote: bool,
    /// Adaptive testing support.
    pub supports_adaptive: bool,
    /// Catalog categories.
    #[serde(default)]
    pub categories: BTreeSet<Category>,
}

impl Recommendation {
    /// Identity set of the recommended product.
    pub fn identity(&self) -> IdentitySet {
        IdentitySet::new(
            &self.canonical_url,
            self.alternate_urls.iter().map(String::as_str),
        )
    }
}

impl From<&CatalogItem> for Recommendation {
    fn from(item: &CatalogItem) -> Self {
        Self {
            canonical_url: item.canonical_url.clone(),
            alternate_urls: item.alternate_urls.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            duration_minutes: item.duration_minutes,
            supports_remote: item.supports_remote,
            supports_adaptive: item.supports_adaptive,
            categories: item.categories.clone(),
        }
    }
}

impl From<&Candidate> for Recommendation {
    fn from(candidate: &Candidate) -> Self {
        Self::from(candidate.item.as_ref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_from_candidate_copies_item_fields() {
        let item = CatalogItem::new(
            "https://www.shl.com/products/product-catalog/view/opq32r/",
            "OPQ32r",
        )
        .with_alternate_url("https://www.shl.com/solutions/products/product-catalog/view/opq/")
        .with_duration(25)
        .with_category("Personality & Behavior")
        .with_remote(true);
        let rec = Recommendation::from(&Candidate::new(0, Arc::new(item), 0.4));

        assert_eq!(rec.name, "OPQ32r");
        assert_eq!(rec.duration_minutes, Some(25));
        assert!(rec.supports_remote);
        assert!(!rec.supports_adaptive);
        assert!(rec.categories.contains(&Category::Personality));
        assert!(rec.identity().contains_url(
            "https://www.shl.com/solutions/products/product-catalog/view/opq/"
        ));
    }

    #[test]
    fn test_serializes_category_labels() {
        let item = CatalogItem::new("https://x.com/view/a", "A").with_category("Knowledge & Skills");
        let json = serde_json::to_value(Recommendation::from(&item)).unwrap();
        assert_eq!(json["categories"][0], "Knowledge & Skills");
        assert_eq!(json["duration_minutes"], serde_json::Value::Null);
    }
}
