//! Paired artifact persistence and freshness checking.
//!
//! A persisted corpus is two files in one directory:
//!
//! - `catalog.json`: the catalog items, in position order
//! - `vectors.json`: an [`IndexMetadata`] header plus the vectors
//!
//! Additional embedding spaces over the same catalog are stored as
//! `vectors-<space>.json` with the same layout.
//!
//! The header records the catalog content hash, so a vector file can only be
//! paired with the exact catalog it was built from. Loading refuses (with
//! [`Error::IndexIntegrity`]) a partial pair, a count or dimension mismatch,
//! or a hash mismatch. Files are written through a temporary sibling and
//! renamed into place, so a crash mid-write leaves the previous file intact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assessa_core::{CatalogItem, Error, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, catalog_hash};
use crate::index::VectorIndex;

/// Catalog metadata file name.
pub const CATALOG_FILE: &str = "catalog.json";

/// Primary vector file name.
pub const VECTORS_FILE: &str = "vectors.json";

/// Space name of the alternate embedding space.
pub const ALTERNATE_SPACE: &str = "alternate";

/// Header stored with every vector file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Catalog content hash at build time.
    pub content_hash: String,

    /// Number of documents indexed.
    pub document_count: usize,

    /// Embedding dimension.
    pub embedding_dimension: usize,

    /// Build timestamp (RFC 3339).
    pub built_at: String,

    /// Embedding provider name.
    pub provider: String,

    /// Model name used for embeddings.
    pub model: String,
}

impl IndexMetadata {
    /// Header describing `index` built over a catalog with `content_hash`.
    pub fn describe(
        index: &VectorIndex,
        content_hash: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            content_hash: content_hash.into(),
            document_count: index.len(),
            embedding_dimension: index.dimension(),
            built_at: chrono::Utc::now().to_rfc3339(),
            provider: provider.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct VectorArtifactRef<'a> {
    metadata: &'a IndexMetadata,
    vectors: &'a [Vec<f32>],
}

#[derive(Deserialize)]
struct VectorArtifact {
    metadata: IndexMetadata,
    vectors: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct VectorHeader {
    metadata: IndexMetadata,
}

/// File name for an embedding space; `None` is the primary space.
pub fn vectors_file_name(space: Option<&str>) -> String {
    match space {
        None => VECTORS_FILE.to_string(),
        Some(name) => format!("vectors-{name}.json"),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|e| Error::io_with_path(e, &tmp))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::io_with_path(e, path))?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    serde_json::from_str(&json)
        .map_err(|e| Error::integrity(format!("{} is corrupt: {e}", path.display())))
}

/// Persist `corpus` into `dir` as a catalog/vector pair.
///
/// Returns the header that was written.
pub fn save_corpus(
    dir: &Path,
    corpus: &Corpus,
    provider: &str,
    model: &str,
) -> Result<IndexMetadata> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;

    let metadata = IndexMetadata::describe(corpus.index(), corpus.content_hash(), provider, model);
    save_space(dir, None, corpus.index(), &metadata)?;

    let items: Vec<&CatalogItem> = corpus.items().iter().map(Arc::as_ref).collect();
    let catalog_json = serde_json::to_vec_pretty(&items)?;
    write_atomic(&dir.join(CATALOG_FILE), &catalog_json)?;

    log::info!(
        "Saved corpus ({} documents, dimension {}) to {}",
        metadata.document_count,
        metadata.embedding_dimension,
        dir.display()
    );
    Ok(metadata)
}

/// Persist one embedding space's vectors with its header.
pub fn save_space(
    dir: &Path,
    space: Option<&str>,
    index: &VectorIndex,
    metadata: &IndexMetadata,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
    let path = dir.join(vectors_file_name(space));
    let artifact = VectorArtifactRef {
        metadata,
        vectors: index.vectors(),
    };
    write_atomic(&path, &serde_json::to_vec(&artifact)?)?;
    Ok(path)
}

/// Load the catalog/vector pair from `dir`.
///
/// # Errors
///
/// - [`Error::NotFound`] if neither file exists
/// - [`Error::IndexIntegrity`] if only one exists, either is corrupt, or
///   they disagree on count, dimension or content hash
pub fn load_corpus(dir: &Path) -> Result<(Corpus, IndexMetadata)> {
    let catalog_path = dir.join(CATALOG_FILE);
    let vectors_path = dir.join(VECTORS_FILE);

    match (catalog_path.exists(), vectors_path.exists()) {
        (false, false) => {
            return Err(Error::not_found(format!(
                "no index artifacts in {}",
                dir.display()
            )));
        }
        (true, false) | (false, true) => {
            return Err(Error::integrity(format!(
                "partial artifact pair in {}: catalog {}, vectors {}",
                dir.display(),
                presence(catalog_path.exists()),
                presence(vectors_path.exists())
            )));
        }
        (true, true) => {}
    }

    let items: Vec<CatalogItem> = read_json(&catalog_path)?;
    let items: Vec<Arc<CatalogItem>> = items.into_iter().map(Arc::new).collect();
    let content_hash = catalog_hash(&items)?;

    let (index, metadata) = load_space(dir, None, &content_hash, items.len())?;
    let corpus = Corpus::new(items, index)?;

    log::debug!(
        "Loaded corpus ({} documents) built {} with {}",
        metadata.document_count,
        metadata.built_at,
        metadata.model
    );
    Ok((corpus, metadata))
}

/// Load one embedding space and validate it against a catalog.
pub fn load_space(
    dir: &Path,
    space: Option<&str>,
    expected_hash: &str,
    expected_count: usize,
) -> Result<(VectorIndex, IndexMetadata)> {
    let path = dir.join(vectors_file_name(space));
    if !path.exists() {
        return Err(Error::integrity(format!(
            "vector artifact {} is missing",
            path.display()
        )));
    }
    let artifact: VectorArtifact = read_json(&path)?;
    let metadata = artifact.metadata;

    if metadata.content_hash != expected_hash {
        return Err(Error::integrity(format!(
            "{} was built from a different catalog (hash {} != {})",
            path.display(),
            metadata.content_hash,
            expected_hash
        )));
    }
    if metadata.document_count != expected_count || artifact.vectors.len() != expected_count {
        return Err(Error::integrity(format!(
            "{} holds {} vectors (header says {}), catalog has {} items",
            path.display(),
            artifact.vectors.len(),
            metadata.document_count,
            expected_count
        )));
    }

    let index = VectorIndex::from_vectors(metadata.embedding_dimension, artifact.vectors)?;
    Ok((index, metadata))
}

/// Read a catalog records file (a JSON array) as produced by the catalog
/// acquisition step.
pub fn read_catalog_file(path: &Path) -> Result<Vec<CatalogItem>> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let items: Vec<CatalogItem> = serde_json::from_str(&json)
        .map_err(|e| Error::parse(format!("{}: {e}", path.display())))?;
    if items.is_empty() {
        return Err(Error::empty(format!("no catalog items in {}", path.display())));
    }
    Ok(items)
}

/// Read only the primary header from `dir`.
pub fn load_metadata(dir: &Path) -> Result<IndexMetadata> {
    let header: VectorHeader = read_json(&dir.join(VECTORS_FILE))?;
    Ok(header.metadata)
}

/// Whether `dir` holds a complete pair built from a catalog with `current_hash`.
pub fn is_index_fresh(dir: &Path, current_hash: &str) -> bool {
    if !dir.join(CATALOG_FILE).exists() {
        return false;
    }
    match load_metadata(dir) {
        Ok(metadata) => metadata.content_hash == current_hash,
        Err(_) => false,
    }
}

fn presence(exists: bool) -> &'static str {
    if exists { "present" } else { "missing" }
}

// ============================================================================
// Tests
// ============================================================================
