//! In-memory cosine similarity index.
//!
//! Vectors are L2-normalized on insertion, so cosine similarity reduces to an
//! inner product. Search is exact (brute force): for catalog-sized corpora a
//! linear scan is fast and keeps results reproducible.
//!
//! # Ordering
//!
//! Hits are sorted by score descending; equal scores keep ascending position
//! order, so the same query against the same index always returns the same
//! list.

use assessa_core::{Error, Result};

use crate::types::VectorHit;

/// Scale `vector` to unit length in place. Zero vectors stay zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Inner product of two equally sized vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Exact nearest-neighbour index over unit vectors.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Build an index from raw vectors, normalizing each.
    ///
    /// Fails with [`Error::IndexIntegrity`] if any vector has the wrong
    /// dimension.
    pub fn from_vectors(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new(dimension);
        for vector in vectors {
            index.push(vector)?;
        }
        Ok(index)
    }

    /// Append one vector; its position is the previous length.
    pub fn push(&mut self, mut vector: Vec<f32>) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(Error::integrity(format!(
                "vector {} has dimension {}, index expects {}",
                self.vectors.len(),
                vector.len(),
                self.dimension
            )));
        }
        l2_normalize(&mut vector);
        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// The `limit` nearest positions to `query`.
    ///
    /// `limit` is clamped to the index size. A query of the wrong dimension
    /// is reported as [`Error::UpstreamUnavailable`]: it means the embedding
    /// service answered with a different model than the index was built
    /// with.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        if query.len() != self.dimension {
            return Err(Error::upstream(format!(
                "query embedding has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut hits: Vec<VectorHit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| VectorHit {
                position,
                score: dot(&query, vector),
            })
            .collect();

        // Stable sort keeps ascending position among equal scores.
        hits.sort_by(|a, b| assessa_core::candidate::descending(a.score, b.score));
        hits.truncate(limit.min(self.vectors.len()));
        Ok(hits)
    }

    /// Similarity between the query and one stored vector.
    pub fn score(&self, query: &[f32], position: usize) -> Option<f32> {
        let vector = self.vectors.get(position)?;
        if query.len() != self.dimension {
            return None;
        }
        let mut query = query.to_vec();
        l2_normalize(&mut query);
        Some(dot(&query, vector))
    }

    /// Stored vectors, in position order.
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
