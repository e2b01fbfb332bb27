//! The learned reranker's model artifact.
//!
//! A [`RelevanceModel`] is a fitted classifier plus the feature-name schema
//! it was trained against. It is written once by the offline trainer and
//! loaded read-only at serving time. Any artifact that does not parse, was
//! trained on a different feature layout or is structurally unsound is
//! rejected at load with [`Error::IndexIntegrity`].

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assessa_core::{Error, Result};

use crate::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::gbdt::{GbdtParams, GradientBoostedTrees};

/// Artifact format version.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Counts describing the data a model was fitted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Labeled queries used.
    pub queries: usize,
    /// Total (features, label) pairs.
    pub samples: usize,
    /// Positive pairs.
    pub positives: usize,
    /// Negative pairs.
    pub negatives: usize,
}

/// A trained relevance classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceModel {
    format_version: u32,
    feature_names: Vec<String>,
    trained_at: DateTime<Utc>,
    summary: TrainingSummary,
    params: GbdtParams,
    classifier: GradientBoostedTrees,
}

impl RelevanceModel {
    /// Wrap a fitted classifier with the current feature schema.
    pub fn new(classifier: GradientBoostedTrees, params: GbdtParams, summary: TrainingSummary) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trained_at: Utc::now(),
            summary,
            params,
            classifier,
        }
    }

    /// Positive-class probability for one feature vector, in `[0, 1]`.
    pub fn predict_relevance_probability(&self, features: &[f32]) -> f32 {
        self.classifier.predict_probability(features)
    }

    /// Training data counts.
    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    /// Hyperparameters used for fitting.
    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    /// When the model was fitted.
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Feature names in vector order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Check the schema and structure against this build.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::integrity(format!(
                "model format {} is not supported (expected {MODEL_FORMAT_VERSION})",
                self.format_version
            )));
        }
        let expected = FEATURE_NAMES.iter().map(|s| s.to_string());
        if self.feature_names.len() != FEATURE_COUNT || !self.feature_names.iter().cloned().eq(expected) {
            return Err(Error::integrity(format!(
                "model feature schema {:?} does not match {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        if self.classifier.feature_count() != FEATURE_COUNT {
            return Err(Error::integrity(format!(
                "classifier expects {} features, not {FEATURE_COUNT}",
                self.classifier.feature_count()
            )));
        }
        self.classifier.validate()
    }

    /// Write the model as JSON, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::io_with_path(e, &tmp))?;
        fs::rename(&tmp, path).map_err(|e| Error::io_with_path(e, path))?;
        log::info!(
            "Saved relevance model ({} trees) to {}",
            self.classifier.tree_count(),
            path.display()
        );
        Ok(())
    }

    /// Load and validate a model.
    ///
    /// A missing file is [`Error::NotFound`]; anything unreadable or
    /// mismatched is [`Error::IndexIntegrity`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::not_found(format!(
                "no relevance model at {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let model: Self = serde_json::from_str(&content).map_err(|e| {
            Error::integrity(format!("corrupt relevance model {}: {e}", path.display()))
        })?;
        model.validate()?;
        log::debug!(
            "Loaded relevance model trained {} on {} samples",
            model.trained_at,
            model.summary.samples
        );
        Ok(model)
    }
}
