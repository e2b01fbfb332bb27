//! The searchable corpus: catalog items aligned with their embeddings.
//!
//! Position N in [`Corpus::items`] and position N in the vector index always
//! refer to the same item. The constructor enforces equal lengths; nothing
//! mutates a corpus after construction.

use std::sync::Arc;

use assessa_core::{CatalogItem, Error, Result};

use crate::index::VectorIndex;
use crate::types::VectorHit;

/// Compute the content hash of a catalog.
///
/// Hashes the canonical JSON serialization of the items in order, so
/// reordering or editing any item changes the hash.
pub fn catalog_hash(items: &[impl AsRef<CatalogItem>]) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for item in items {
        let json = serde_json::to_vec(item.as_ref())?;
        hasher.update(&(json.len() as u64).to_le_bytes());
        hasher.update(&json);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Catalog items plus their positionally aligned embeddings.
#[derive(Debug, Clone)]
pub struct Corpus {
    items: Vec<Arc<CatalogItem>>,
    index: VectorIndex,
    content_hash: String,
}

impl Corpus {
    /// Pair items with an index.
    ///
    /// Fails with [`Error::IndexIntegrity`] if the counts differ.
    pub fn new(items: Vec<Arc<CatalogItem>>, index: VectorIndex) -> Result<Self> {
        if items.len() != index.len() {
            return Err(Error::integrity(format!(
                "catalog has {} items but index has {} vectors",
                items.len(),
                index.len()
            )));
        }
        let content_hash = catalog_hash(&items)?;
        Ok(Self {
            items,
            index,
            content_hash,
        })
    }

    /// Item at `position`.
    pub fn item(&self, position: usize) -> Option<&Arc<CatalogItem>> {
        self.items.get(position)
    }

    /// All items in position order.
    pub fn items(&self) -> &[Arc<CatalogItem>] {
        &self.items
    }

    /// The vector index.
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Nearest neighbours of `query`.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        self.index.search(query, limit)
    }

    /// Catalog content hash.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
