//! Offline training of the learned reranker.
//!
//! Training replays each labeled query through the standard path up to the
//! soft filter, labels the resulting pool, and fits a relevance model on
//! the accumulated pairs. It runs as a batch step, never inside a query.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use assessa_core::{LearnedRerankConfig, Result};
use assessa_rerank::{LabeledQuery, RelevanceModel, TrainingSet};

use crate::engine::Engine;

/// Fit a relevance model from `labeled` queries run against `engine`.
///
/// # Errors
///
/// - [`assessa_core::Error::UpstreamUnavailable`] if a query cannot be
///   embedded
/// - [`assessa_core::Error::TrainingDataInsufficient`] if too few relevant
///   items were retrieved
pub async fn train_reranker(
    engine: &Engine,
    labeled: &[LabeledQuery],
    config: &LearnedRerankConfig,
) -> Result<RelevanceModel> {
    let mut set = TrainingSet::new();

    for query in labeled {
        let signals = engine.analyze(&query.query)?;
        let pool = engine.candidate_pool(&signals, config.training_pool).await?;
        set.add_query(query, &signals, &pool);
    }

    log::info!(
        "Collected {} training pairs from {} queries ({} positive)",
        set.len(),
        labeled.len(),
        set.positives()
    );
    set.fit(config)
}

/// Produces the relevance model at most once per process.
///
/// The first caller loads the artifact at `model_path`, or trains and saves
/// one when it is missing or unusable. Concurrent callers wait for that
/// single run and share its result. A failed run is not cached, so a later
/// call retries.
pub struct LazyTrainer {
    model_path: PathBuf,
    labeled: Vec<LabeledQuery>,
    config: LearnedRerankConfig,
    model: OnceCell<Arc<RelevanceModel>>,
}

impl LazyTrainer {
    /// Create a trainer for the artifact at `model_path`.
    pub fn new(
        model_path: impl Into<PathBuf>,
        labeled: Vec<LabeledQuery>,
        config: LearnedRerankConfig,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            labeled,
            config,
            model: OnceCell::new(),
        }
    }

    /// Artifact location.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Whether a model has been produced.
    pub fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    /// The model, loading or training it on first use.
    pub async fn get_or_train(&self, engine: &Engine) -> Result<Arc<RelevanceModel>> {
        self.model
            .get_or_try_init(|| async {
                match RelevanceModel::load(&self.model_path) {
                    Ok(model) => {
                        log::info!("Using relevance model at {}", self.model_path.display());
                        return Ok(Arc::new(model));
                    }
                    Err(e) => log::info!("Training relevance model ({e})"),
                }
                let model = train_reranker(engine, &self.labeled, &self.config).await?;
                model.save(&self.model_path)?;
                Ok::<_, assessa_core::Error>(Arc::new(model))
            })
            .await
            .map(Arc::clone)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::EngineBuilder;
    use assessa_core::{CatalogItem, Error};
    use assessa_vector::{CorpusBuilder, MockEmbeddingProvider};

    fn url(i: usize) -> String {
        format!("https://www.shl.com/products/product-catalog/view/item-{i}/")
    }

    async fn engine() -> Engine {
        let items = (0..24)
            .map(|i| {
                let name = if i % 3 == 0 {
                    format!("Java Skills {i}")
                } else {
                    format!("Verbal Reasoning {i}")
                };
                CatalogItem::new(url(i), name).with_duration(20 + i as u32)
            })
            .collect();
        let provider = Arc::new(MockEmbeddingProvider::new(16));
        let (corpus, _) = CorpusBuilder::new(provider.clone()).build(items).await.unwrap();
        EngineBuilder::new(Arc::new(corpus), provider).build().unwrap()
    }

    fn labeled() -> Vec<LabeledQuery> {
        vec![
            LabeledQuery::new("java developer", (0..24).step_by(3).map(url).collect()),
            LabeledQuery::new("java programmer", (0..12).step_by(3).map(url).collect()),
        ]
    }

    fn config() -> LearnedRerankConfig {
        LearnedRerankConfig {
            rounds: 10,
            max_depth: 3,
            training_pool: 24,
            ..LearnedRerankConfig::default()
        }
    }

    #[tokio::test]
    async fn test_train_reranker() {
        let engine = engine().await;
        let model = train_reranker(&engine, &labeled(), &config()).await.unwrap();
        assert_eq!(model.summary().queries, 2);
        assert_eq!(model.summary().positives, 12);
        assert_eq!(model.summary().samples, 48);
    }

    #[tokio::test]
    async fn test_train_reranker_insufficient_positives() {
        let engine = engine().await;
        let labels = vec![LabeledQuery::new("java", vec![url(0)])];
        let err = train_reranker(&engine, &labels, &config()).await.unwrap_err();
        assert!(matches!(err, Error::TrainingDataInsufficient { positives: 1, .. }));
    }

    #[tokio::test]
    async fn test_lazy_trainer_runs_once() {
        let engine = engine().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("reranker.json");
        let trainer = LazyTrainer::new(&path, labeled(), config());
        assert!(!trainer.is_ready());

        let (a, b) = tokio::join!(trainer.get_or_train(&engine), trainer.get_or_train(&engine));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(trainer.is_ready());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_lazy_trainer_reuses_saved_model() {
        let engine = engine().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reranker.json");
        let trained = train_reranker(&engine, &labeled(), &config()).await.unwrap();
        trained.save(&path).unwrap();

        // No labels: only a successful load can produce a model.
        let trainer = LazyTrainer::new(&path, Vec::new(), config());
        let model = trainer.get_or_train(&engine).await.unwrap();
        assert_eq!(model.trained_at(), trained.trained_at());
    }

    #[tokio::test]
    async fn test_lazy_trainer_failure_is_not_cached() {
        let engine = engine().await;
        let dir = tempfile::tempdir().unwrap();
        let trainer = LazyTrainer::new(dir.path().join("m.json"), Vec::new(), config());
        assert!(trainer.get_or_train(&engine).await.is_err());
        assert!(!trainer.is_ready());
    }
}
