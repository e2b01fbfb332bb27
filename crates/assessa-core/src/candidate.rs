//! Per-query candidate records and ordering helpers.
//!
//! A [`Candidate`] pairs a shared catalog item with the scores accumulated by
//! each pipeline stage. Every stage emits its list sorted descending by the
//! score it owns; [`sort_by_score`] is the one place that ordering is done so
//! ties keep their incoming order everywhere.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::CatalogItem;

/// A catalog item under consideration for one query.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Position of the item in the corpus (and in the vector index).
    pub position: usize,
    /// The item itself, shared with the corpus.
    pub item: Arc<CatalogItem>,
    /// Cosine similarity between the query and the item embedding.
    pub semantic_score: f32,
    /// Lexical and metadata evidence.
    pub keyword_score: f32,
    /// Blended score carried through filtering and rule reranking.
    pub combined_score: f32,
    /// Score assigned by the reranking strategy that ran.
    pub rerank_score: f32,
    /// Fused score when produced by the ensemble.
    pub ensemble_score: f32,
}

impl Candidate {
    /// A candidate with only its semantic score set.
    pub fn new(position: usize, item: Arc<CatalogItem>, semantic_score: f32) -> Self {
        Self {
            position,
            item,
            semantic_score,
            keyword_score: 0.0,
            combined_score: semantic_score,
            rerank_score: 0.0,
            ensemble_score: 0.0,
        }
    }
}

/// Score fields a stage can sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    /// [`Candidate::semantic_score`]
    Semantic,
    /// [`Candidate::keyword_score`]
    Keyword,
    /// [`Candidate::combined_score`]
    Combined,
    /// [`Candidate::rerank_score`]
    Rerank,
    /// [`Candidate::ensemble_score`]
    Ensemble,
}

impl ScoreField {
    /// Read this field from a candidate.
    pub fn get(self, candidate: &Candidate) -> f32 {
        match self {
            Self::Semantic => candidate.semantic_score,
            Self::Keyword => candidate.keyword_score,
            Self::Combined => candidate.combined_score,
            Self::Rerank => candidate.rerank_score,
            Self::Ensemble => candidate.ensemble_score,
        }
    }
}

/// Compare two scores for a descending sort. NaN sorts last.
pub fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Stable descending sort by one score field.
pub fn sort_by_score(candidates: &mut [Candidate], field: ScoreField) {
    candidates.sort_by(|a, b| descending(field.get(a), field.get(b)));
}

/// Whether the list is sorted descending by `field`.
pub fn is_sorted_by_score(candidates: &[Candidate], field: ScoreField) -> bool {
    candidates
        .windows(2)
        .all(|pair| descending(field.get(&pair[0]), field.get(&pair[1])) != Ordering::Greater)
}
