//! Identity canonicalization for catalog item URLs.
//!
//! The same catalog item is published under more than one URL: with or
//! without the `/solutions/` path prefix, with trailing slashes, and with
//! percent-encoded punctuation. Comparing raw URLs therefore misses matches.
//! This module reduces URLs to *slugs* and groups every known slug for an
//! item into an [`IdentitySet`]; two references denote the same item iff
//! their identity sets intersect.
//!
//! All functions are pure string transforms.
//!
//! # Example
//!
//! ```
//! use assessa_core::identity::{normalize, urls_match};
//!
//! let a = "https://example.com/solutions/products/product-catalog/view/core-java/";
//! let b = "https://example.com/products/product-catalog/view/core-java";
//! assert_eq!(normalize(a), "core-java");
//! assert!(urls_match(a, b));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const VIEW_MARKER: &str = "/view/";
const SOLUTIONS_PATH: &str = "/solutions/products/product-catalog/view/";
const PRODUCTS_PATH: &str = "/products/product-catalog/view/";

const PERCENT_DECODES: &[(&str, &str)] = &[("%28", "("), ("%29", ")"), ("%20", " "), ("%2d", "-")];

/// Reduce a URL to its canonical slug.
///
/// Trims and lowercases the input, strips trailing slashes, keeps only the
/// segment after the last `/view/` (if any) and decodes the handful of
/// percent escapes catalog URLs use. Idempotent.
pub fn normalize(url: &str) -> String {
    let lowered = url.trim().to_lowercase();
    let trimmed = lowered.trim_end_matches('/');

    let slug = match trimmed.rfind(VIEW_MARKER) {
        Some(pos) => &trimmed[pos + VIEW_MARKER.len()..],
        None => trimmed,
    };

    let mut decoded = slug.to_string();
    for (escape, replacement) in PERCENT_DECODES {
        decoded = decoded.replace(escape, replacement);
    }
    decoded
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// The same URL under the other catalog path convention, if it uses one.
pub fn mirror_url(url: &str) -> Option<String> {
    let lowered = url.trim().to_lowercase();
    if let Some(pos) = lowered.find(SOLUTIONS_PATH) {
        let mut mirrored = lowered.clone();
        mirrored.replace_range(pos..pos + SOLUTIONS_PATH.len(), PRODUCTS_PATH);
        return Some(mirrored);
    }
    if let Some(pos) = lowered.find(PRODUCTS_PATH) {
        let mut mirrored = lowered.clone();
        mirrored.replace_range(pos..pos + PRODUCTS_PATH.len(), SOLUTIONS_PATH);
        return Some(mirrored);
    }
    None
}

/// All slugs under which one catalog item is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySet {
    slugs: BTreeSet<String>,
}

impl IdentitySet {
    /// Build the identity set for a URL and its known alternates.
    pub fn new<'a>(url: &str, alternates: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::default();
        set.insert_url(url);
        for alternate in alternates {
            set.insert_url(alternate);
        }
        set
    }

    /// Build the identity set for a bare URL.
    pub fn from_url(url: &str) -> Self {
        Self::new(url, std::iter::empty())
    }

    fn insert_url(&mut self, url: &str) {
        let slug = normalize(url);
        if !slug.is_empty() {
            self.slugs.insert(slug);
        }
        if let Some(mirrored) = mirror_url(url) {
            let slug = normalize(&mirrored);
            if !slug.is_empty() {
                self.slugs.insert(slug);
            }
        }
    }

    /// Whether two sets share at least one slug.
    pub fn intersects(&self, other: &IdentitySet) -> bool {
        // Iterate the smaller set.
        let (small, large) = if self.slugs.len() <= other.slugs.len() {
            (&self.slugs, &other.slugs)
        } else {
            (&other.slugs, &self.slugs)
        };
        small.iter().any(|slug| large.contains(slug))
    }

    /// Whether the set contains the slug of `url`.
    pub fn contains_url(&self, url: &str) -> bool {
        self.slugs.contains(&normalize(url))
    }

    /// Iterate over the slugs in sorted order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.slugs.iter().map(String::as_str)
    }

    /// Number of distinct slugs.
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    /// Whether no slug could be derived.
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

/// Identity set of a URL with no known alternates.
pub fn variants(url: &str) -> IdentitySet {
    IdentitySet::from_url(url)
}

/// Whether two URLs refer to the same catalog item.
pub fn urls_match(a: &str, b: &str) -> bool {
    variants(a).intersects(&variants(b))
}

// ============================================================================
// Tests
// ============================================================================
