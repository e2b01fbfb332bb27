//! Learned reranking with a trained relevance model.

use std::path::Path;
use std::sync::Arc;

use assessa_core::{Candidate, QuerySignals, Result, ScoreField, sort_by_score};

use crate::features::FeatureExtractor;
use crate::model::RelevanceModel;

/// Scores candidates with a [`RelevanceModel`].
#[derive(Debug, Clone)]
pub struct LearnedReranker {
    model: Arc<RelevanceModel>,
}

impl LearnedReranker {
    /// Wrap a loaded model.
    pub fn new(model: Arc<RelevanceModel>) -> Self {
        Self { model }
    }

    /// Load and validate a model artifact.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(RelevanceModel::load(path)?)))
    }

    /// The underlying model.
    pub fn model(&self) -> &RelevanceModel {
        &self.model
    }

    /// Store the relevance probability in `rerank_score` and sort by it.
    pub fn rerank(&self, signals: &QuerySignals, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        let extractor = FeatureExtractor::new(signals);
        for candidate in &mut candidates {
            let features = extractor.extract(candidate);
            candidate.rerank_score = self.model.predict_relevance_probability(&features);
        }
        sort_by_score(&mut candidates, ScoreField::Rerank);
        candidates
    }
}
