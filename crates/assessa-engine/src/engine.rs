//! The query-to-ranking pipeline.
//!
//! An [`Engine`] is built once by [`EngineBuilder`] and is immutable
//! afterwards; concurrent queries share it through an `Arc`. The standard
//! (hybrid) path is:
//!
//! ```text
//! query ─▶ analyze ─▶ expand ─▶ embed (timeout) ─▶ vector search
//!       ─▶ hybrid score ─▶ soft filter ─▶ rerank chain ─▶ top-k
//! ```
//!
//! The ensemble path runs several strategy variants over the same query and
//! fuses their lists (see [`crate::ensemble`]).

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use assessa_core::{Candidate, EngineConfig, Error, QuerySignals, Result};
use assessa_query::{HybridScorer, QueryAnalyzer, SoftFilter};
use assessa_rerank::{
    CompletionProvider, LearnedReranker, LlmReranker, RelevanceModel, RerankChain,
    RuleBasedReranker, StrategyKind,
};
use assessa_vector::{
    Corpus, EmbedMode, EmbeddingProvider, TimeoutEmbedder, VectorHit, VectorIndex,
};

use crate::ensemble::{EnsembleStrategy, StrategyList, fuse};
use crate::recommendation::Recommendation;

// ============================================================================
// Retrieval strategy
// ============================================================================

/// How `retrieve` ranks the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalStrategy {
    /// Hybrid scoring, soft filtering and the rerank chain.
    #[default]
    Hybrid,
    /// Fusion of several strategy variants.
    Ensemble,
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hybrid => "hybrid",
            Self::Ensemble => "ensemble",
        })
    }
}

impl FromStr for RetrievalStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hybrid" => Ok(Self::Hybrid),
            "ensemble" => Ok(Self::Ensemble),
            other => Err(Error::invalid_data(format!(
                "unknown retrieval strategy '{other}' (expected hybrid or ensemble)"
            ))),
        }
    }
}

/// A ranked result with how it was produced.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// At most `top_k` candidates, best first.
    pub candidates: Vec<Candidate>,
    /// Retrieval strategy that ran.
    pub strategy: RetrievalStrategy,
    /// Reranking strategy that ordered the final list, if any.
    pub reranked_by: Option<StrategyKind>,
}

impl Ranking {
    fn empty(strategy: RetrievalStrategy) -> Self {
        Self {
            candidates: Vec::new(),
            strategy,
            reranked_by: None,
        }
    }

    /// The candidates as caller-facing records.
    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.candidates.iter().map(Recommendation::from).collect()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// A second embedding space over the same catalog.
struct AlternateSpace {
    embedder: TimeoutEmbedder,
    index: VectorIndex,
}

/// Assembles an [`Engine`].
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(Arc::new(corpus), provider)
///     .with_config(config)
///     .with_model_file(&model_path)
///     .build()?;
/// ```
pub struct EngineBuilder {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
    alternate: Option<(Arc<dyn EmbeddingProvider>, VectorIndex)>,
    model: Option<Arc<RelevanceModel>>,
    completion: Option<Arc<dyn CompletionProvider>>,
}

impl EngineBuilder {
    /// Start from a loaded corpus and its primary embedding provider.
    pub fn new(corpus: Arc<Corpus>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            corpus,
            embedder,
            config: EngineConfig::default(),
            alternate: None,
            model: None,
            completion: None,
        }
    }

    /// Set the pipeline configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an alternate embedding space for the ensemble.
    pub fn with_alternate_space(
        mut self,
        embedder: Arc<dyn EmbeddingProvider>,
        index: VectorIndex,
    ) -> Self {
        self.alternate = Some((embedder, index));
        self
    }

    /// Use a trained relevance model for learned reranking.
    pub fn with_relevance_model(mut self, model: Arc<RelevanceModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Load the relevance model at `path`.
    ///
    /// A missing or unusable model is logged and the engine serves with the
    /// remaining strategies.
    pub fn with_model_file(mut self, path: &Path) -> Self {
        match RelevanceModel::load(path) {
            Ok(model) => self.model = Some(Arc::new(model)),
            Err(e) => log::warn!(
                "Relevance model unavailable, using rule-based reranking: {e}"
            ),
        }
        self
    }

    /// Use `provider` for LLM-assisted reranking when enabled in config.
    pub fn with_completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(provider);
        self
    }

    /// Validate the parts and build the engine.
    ///
    /// # Errors
    ///
    /// [`Error::IndexIntegrity`] when an embedding provider's dimension does
    /// not match its index, or the alternate index is not aligned with the
    /// corpus.
    pub fn build(self) -> Result<Engine> {
        let config = self.config;
        let timeout = Duration::from_millis(config.retrieval.embedding_timeout_ms);

        if self.embedder.dimension() != self.corpus.index().dimension() {
            return Err(Error::integrity(format!(
                "embedding provider '{}' has dimension {}, index has {}",
                self.embedder.name(),
                self.embedder.dimension(),
                self.corpus.index().dimension()
            )));
        }
        if self.corpus.is_empty() {
            log::warn!("Building engine over an empty corpus");
        }

        let alternate = match self.alternate {
            Some((embedder, index)) => {
                if index.len() != self.corpus.len() {
                    return Err(Error::integrity(format!(
                        "alternate index holds {} vectors, corpus has {} items",
                        index.len(),
                        self.corpus.len()
                    )));
                }
                if embedder.dimension() != index.dimension() {
                    return Err(Error::integrity(format!(
                        "alternate provider '{}' has dimension {}, alternate index has {}",
                        embedder.name(),
                        embedder.dimension(),
                        index.dimension()
                    )));
                }
                Some(AlternateSpace {
                    embedder: TimeoutEmbedder::new(embedder, timeout),
                    index,
                })
            }
            None => None,
        };

        let rules = RuleBasedReranker::new(config.rules.clone(), config.filter.clone());
        let mut chain = RerankChain::new(rules.clone());

        if let Some(model) = self.model {
            match model.validate() {
                Ok(()) => chain = chain.with_learned(LearnedReranker::new(model)),
                Err(e) => log::warn!("Ignoring invalid relevance model: {e}"),
            }
        }

        match self.completion {
            Some(provider) if config.external.enabled => {
                chain = chain.with_external(LlmReranker::new(provider, config.external.clone()));
            }
            Some(provider) => log::debug!(
                "Completion provider '{}' supplied but LLM reranking is disabled",
                provider.name()
            ),
            None => {}
        }

        log::info!(
            "Engine ready: {} items, dimension {}, strategies {:?}, alternate space {}",
            self.corpus.len(),
            self.corpus.index().dimension(),
            chain
                .strategies()
                .iter()
                .map(|s| s.kind().to_string())
                .collect::<Vec<_>>(),
            alternate.is_some()
        );

        Ok(Engine {
            embedder: TimeoutEmbedder::new(self.embedder, timeout),
            corpus: self.corpus,
            alternate,
            analyzer: QueryAnalyzer::new(),
            hybrid: HybridScorer::new(config.scoring.clone()),
            keyword: HybridScorer::new(config.keyword_only.clone()),
            filter: SoftFilter::new(config.filter.clone()),
            rules,
            chain,
            config,
        })
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The immutable ranking context.
pub struct Engine {
    corpus: Arc<Corpus>,
    embedder: TimeoutEmbedder,
    alternate: Option<AlternateSpace>,
    config: EngineConfig,
    analyzer: QueryAnalyzer,
    hybrid: HybridScorer,
    keyword: HybridScorer,
    filter: SoftFilter,
    rules: RuleBasedReranker,
    chain: RerankChain,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("items", &self.corpus.len())
            .field("embedder", &self.embedder.name())
            .field("alternate_space", &self.alternate.is_some())
            .field("chain", &self.chain)
            .finish()
    }
}

impl Engine {
    /// The loaded corpus.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The reranking chain.
    pub fn rerank_chain(&self) -> &RerankChain {
        &self.chain
    }

    /// Whether a learned reranker is loaded.
    pub fn has_learned_reranker(&self) -> bool {
        self.chain.has(StrategyKind::Learned)
    }

    /// Whether an alternate embedding space is configured.
    pub fn has_alternate_space(&self) -> bool {
        self.alternate.is_some()
    }

    /// Name of the primary embedding provider.
    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Derive signals for `query`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidData`] for an empty or whitespace-only query.
    pub fn analyze(&self, query: &str) -> Result<QuerySignals> {
        if query.trim().is_empty() {
            return Err(Error::invalid_data("query is empty"));
        }
        Ok(self.analyzer.analyze(query))
    }

    /// The standard path up to (not including) reranking.
    ///
    /// Embeds the expanded query, searches the index, hybrid-scores the hits,
    /// keeps the best `size` and applies the soft filter.
    ///
    /// # Errors
    ///
    /// [`Error::UpstreamUnavailable`] when the embedding call fails or times
    /// out.
    pub async fn candidate_pool(
        &self,
        signals: &QuerySignals,
        size: usize,
    ) -> Result<Vec<Candidate>> {
        let text = self.analyzer.expand(signals);
        let vector = self.embedder.embed(&text, EmbedMode::Query).await?;
        self.pool_from_vector(signals, &text, &vector, size)
    }

    /// Rank the catalog for `query` and return caller-facing records.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        strategy: RetrievalStrategy,
        use_learned_rerank: bool,
    ) -> Result<Vec<Recommendation>> {
        let ranking = self.rank(query, top_k, strategy, use_learned_rerank).await?;
        Ok(ranking.recommendations())
    }

    /// Rank the catalog for `query`, keeping scores and provenance.
    ///
    /// `use_learned_rerank = false` skips the learned strategy for this call
    /// only.
    pub async fn rank(
        &self,
        query: &str,
        top_k: usize,
        strategy: RetrievalStrategy,
        use_learned_rerank: bool,
    ) -> Result<Ranking> {
        let signals = self.analyze(query)?;
        if top_k == 0 {
            return Ok(Ranking::empty(strategy));
        }

        let started = Instant::now();
        let ranking = match strategy {
            RetrievalStrategy::Hybrid => {
                self.rank_hybrid(&signals, top_k, use_learned_rerank).await?
            }
            RetrievalStrategy::Ensemble => self.rank_ensemble(&signals, top_k).await?,
        };

        log::debug!(
            "{strategy} retrieval returned {} results in {:?} (reranked by {})",
            ranking.candidates.len(),
            started.elapsed(),
            ranking
                .reranked_by
                .map(|k| k.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(ranking)
    }

    async fn rank_hybrid(
        &self,
        signals: &QuerySignals,
        top_k: usize,
        use_learned: bool,
    ) -> Result<Ranking> {
        let pool = self
            .candidate_pool(signals, self.config.retrieval.pool_size)
            .await?;

        let depth = top_k
            .saturating_mul(self.config.retrieval.rerank_pool_multiplier)
            .max(top_k)
            .min(pool.len());
        let outcome = self
            .chain
            .rerank(signals, &pool[..depth], top_k, |kind| {
                use_learned || kind != StrategyKind::Learned
            })
            .await;

        Ok(Ranking {
            candidates: outcome.candidates,
            strategy: RetrievalStrategy::Hybrid,
            reranked_by: Some(outcome.strategy),
        })
    }

    async fn rank_ensemble(&self, signals: &QuerySignals, top_k: usize) -> Result<Ranking> {
        let depth = top_k
            .saturating_mul(self.config.ensemble.depth_multiplier)
            .max(top_k);
        let text = self.analyzer.expand(signals);
        let primary = self.embedder.embed(&text, EmbedMode::Query).await;
        let mut run = EnsembleRun::new(depth);

        let hybrid = match &primary {
            Ok(vector) => self.hybrid_list(signals, &text, vector),
            Err(e) => Err(replay(e)),
        };
        let duration_filtered = match (&hybrid, signals.duration_bound) {
            (_, None) => None,
            (Ok(list), Some(bound)) => Some(Ok(self.within_duration(list, bound))),
            (Err(e), Some(_)) => Some(Err(replay(e))),
        };
        run.record(EnsembleStrategy::Hybrid, hybrid);

        run.record(
            EnsembleStrategy::Semantic,
            match &primary {
                Ok(vector) => self.semantic_list(vector, depth),
                Err(e) => Err(replay(e)),
            },
        );

        run.record(
            EnsembleStrategy::KeywordOnly,
            match &primary {
                Ok(vector) => self.keyword_list(signals, &text, vector),
                Err(e) => Err(replay(e)),
            },
        );

        match &self.alternate {
            Some(space) => {
                let list = self.alternate_list(space, &text, depth).await;
                run.record(EnsembleStrategy::AlternateSpace, list);
            }
            None => log::debug!("No alternate embedding space; skipping that strategy"),
        }

        if let Some(list) = duration_filtered {
            run.record(EnsembleStrategy::DurationFiltered, list);
        }

        let lists = run.finish()?;
        let mut fused = fuse(&lists, &self.config.ensemble);
        let mut reranked_by = None;

        if self.config.ensemble.llm_rerank
            && let Some(llm) = self.chain.external()
        {
            match llm.rerank(signals, &fused, top_k).await {
                Ok(ranked) => {
                    fused = ranked;
                    reranked_by = Some(StrategyKind::External);
                }
                Err(failure) => {
                    log::warn!("LLM rerank of fused list failed, keeping fused order: {failure}")
                }
            }
        }

        fused.truncate(top_k);
        Ok(Ranking {
            candidates: fused,
            strategy: RetrievalStrategy::Ensemble,
            reranked_by,
        })
    }

    fn pool_from_vector(
        &self,
        signals: &QuerySignals,
        text: &str,
        vector: &[f32],
        size: usize,
    ) -> Result<Vec<Candidate>> {
        let depth = self.config.retrieval.search_depth.min(self.corpus.len());
        let hits = self.corpus.search(vector, depth)?;
        let mut candidates = self.hybrid.score(signals, text, &hits, &self.corpus);
        candidates.truncate(size);
        Ok(self.filter.apply(signals, candidates))
    }

    fn hybrid_list(
        &self,
        signals: &QuerySignals,
        text: &str,
        vector: &[f32],
    ) -> Result<Vec<Candidate>> {
        let pool =
            self.pool_from_vector(signals, text, vector, self.config.retrieval.pool_size)?;
        Ok(self.rules.rerank(signals, pool))
    }

    fn semantic_list(&self, vector: &[f32], depth: usize) -> Result<Vec<Candidate>> {
        let hits = self.corpus.search(vector, depth)?;
        Ok(self.hits_to_candidates(&hits))
    }

    fn keyword_list(
        &self,
        signals: &QuerySignals,
        text: &str,
        vector: &[f32],
    ) -> Result<Vec<Candidate>> {
        let hits = self
            .corpus
            .search(vector, self.config.retrieval.search_depth)?;
        Ok(self
            .keyword
            .score_keyword_only(signals, text, &hits, &self.corpus))
    }

    async fn alternate_list(
        &self,
        space: &AlternateSpace,
        text: &str,
        depth: usize,
    ) -> Result<Vec<Candidate>> {
        let vector = space.embedder.embed(text, EmbedMode::Query).await?;
        let hits = space.index.search(&vector, depth)?;
        Ok(self.hits_to_candidates(&hits))
    }

    fn within_duration(&self, ranked: &[Candidate], bound: u32) -> Vec<Candidate> {
        let limit = self.config.filter.tolerated_duration(bound);
        ranked
            .iter()
            .filter(|c| c.item.duration_minutes.is_some_and(|m| m as f32 <= limit))
            .cloned()
            .collect()
    }

    fn hits_to_candidates(&self, hits: &[VectorHit]) -> Vec<Candidate> {
        hits.iter()
            .filter_map(|hit| {
                let item = self.corpus.item(hit.position)?;
                Some(Candidate::new(hit.position, Arc::clone(item), hit.score))
            })
            .collect()
    }
}

/// Re-raise a shared primary-embedding failure for each dependent strategy.
fn replay(err: &Error) -> Error {
    match err {
        Error::UpstreamUnavailable(msg) => Error::upstream(msg.clone()),
        other => Error::operation(other.to_string()),
    }
}

/// Collects strategy lists and failures for one ensemble query.
struct EnsembleRun {
    depth: usize,
    lists: Vec<StrategyList>,
    failures: Vec<(EnsembleStrategy, Error)>,
}

impl EnsembleRun {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            lists: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn record(&mut self, strategy: EnsembleStrategy, result: Result<Vec<Candidate>>) {
        match result {
            Ok(mut candidates) => {
                candidates.truncate(self.depth);
                log::debug!("Ensemble strategy {strategy} produced {} candidates", candidates.len());
                self.lists.push(StrategyList::new(strategy, candidates));
            }
            Err(e) => {
                log::warn!("Ensemble strategy {strategy} failed: {e}");
                self.failures.push((strategy, e));
            }
        }
    }

    /// The successful lists, or an error when every strategy failed.
    fn finish(self) -> Result<Vec<StrategyList>> {
        if !self.lists.is_empty() || self.failures.is_empty() {
            return Ok(self.lists);
        }

        if self.failures.iter().all(|(_, e)| e.is_upstream()) {
            let names: Vec<String> = self.failures.iter().map(|(s, _)| s.to_string()).collect();
            return Err(Error::upstream(format!(
                "every ensemble strategy failed ({})",
                names.join(", ")
            )));
        }
        match self.failures.into_iter().find(|(_, e)| !e.is_upstream()) {
            Some((_, e)) => Err(e),
            None => Err(Error::operation("every ensemble strategy failed")),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assessa_core::{CatalogItem, ScoreField, is_sorted_by_score};
    use assessa_rerank::MockCompletionProvider;
    use assessa_vector::{CorpusBuilder, MockEmbeddingProvider};
    use async_trait::async_trait;

    const DIM: usize = 16;

    struct Unavailable;

    #[async_trait]
    impl EmbeddingProvider for Unavailable {
        async fn embed(&self, _text: &str, _mode: EmbedMode) -> Result<Vec<f32>> {
            Err(Error::upstream("connection refused"))
        }

        async fn embed_batch(&self, _texts: &[&str], _mode: EmbedMode) -> Result<Vec<Vec<f32>>> {
            Err(Error::upstream("connection refused"))
        }

        fn dimension(&self) -> usize {
            DIM
        }

        fn name(&self) -> &str {
            "unavailable"
        }
    }

    fn items() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(
                "https://www.shl.com/solutions/products/product-catalog/view/core-java-advanced/",
                "Core Java Advanced",
            )
            .with_description("Tests advanced Java programming knowledge")
            .with_duration(40)
            .with_category("Knowledge & Skills"),
            CatalogItem::new(
                "https://www.shl.com/products/product-catalog/view/entry-level-sales/",
                "Entry Level Sales",
            )
            .with_description("Situational judgement for new sales hires")
            .with_duration(20)
            .with_category("Biodata & Situational Judgement"),
            CatalogItem::new(
                "https://www.shl.com/products/product-catalog/view/opq32r/",
                "OPQ Personality",
            )
            .with_description("Occupational personality questionnaire")
            .with_duration(25)
            .with_category("Personality & Behavior"),
        ]
    }

    async fn corpus() -> Arc<Corpus> {
        let provider = Arc::new(MockEmbeddingProvider::new(DIM));
        let (corpus, _) = CorpusBuilder::new(provider).build(items()).await.unwrap();
        Arc::new(corpus)
    }

    async fn engine() -> Engine {
        EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .build()
            .unwrap()
    }

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_send_sync() {
        _assert_send_sync::<Engine>();
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Hybrid".parse::<RetrievalStrategy>().unwrap(), RetrievalStrategy::Hybrid);
        assert_eq!(" ensemble ".parse::<RetrievalStrategy>().unwrap(), RetrievalStrategy::Ensemble);
        assert!(matches!(
            "fused".parse::<RetrievalStrategy>(),
            Err(Error::InvalidData(_))
        ));
        assert_eq!(RetrievalStrategy::Ensemble.to_string(), "ensemble");
    }

    #[tokio::test]
    async fn test_build_rejects_dimension_mismatch() {
        let result = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(8)))
            .build();
        assert!(matches!(result, Err(Error::IndexIntegrity(_))));
    }

    #[tokio::test]
    async fn test_build_rejects_misaligned_alternate_space() {
        let index = VectorIndex::from_vectors(8, vec![vec![1.0; 8]]).unwrap();
        let result = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .with_alternate_space(Arc::new(MockEmbeddingProvider::new(8)), index)
            .build();
        assert!(matches!(result, Err(Error::IndexIntegrity(_))));
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid() {
        let engine = engine().await;
        let err = engine
            .retrieve("   ", 5, RetrievalStrategy::Hybrid, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_zero_top_k_is_empty() {
        let engine = engine().await;
        let results = engine
            .retrieve("java developer", 0, RetrievalStrategy::Hybrid, true)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_hybrid_respects_top_k() {
        let engine = engine().await;
        let ranking = engine
            .rank("java developer", 2, RetrievalStrategy::Hybrid, true)
            .await
            .unwrap();
        assert_eq!(ranking.candidates.len(), 2);
        assert_eq!(ranking.reranked_by, Some(StrategyKind::RuleBased));
        assert!(is_sorted_by_score(&ranking.candidates, ScoreField::Combined));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_upstream_not_empty() {
        let engine = EngineBuilder::new(corpus().await, Arc::new(Unavailable))
            .build()
            .unwrap();
        let err = engine
            .retrieve("java developer", 5, RetrievalStrategy::Hybrid, true)
            .await
            .unwrap_err();
        assert!(err.is_upstream());

        let err = engine
            .retrieve("java developer", 5, RetrievalStrategy::Ensemble, true)
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_candidate_pool_size() {
        let engine = engine().await;
        let signals = engine.analyze("personality questionnaire").unwrap();
        let pool = engine.candidate_pool(&signals, 2).await.unwrap();
        assert_eq!(pool.len(), 2);
        assert!(is_sorted_by_score(&pool, ScoreField::Combined));
    }

    #[tokio::test]
    async fn test_missing_model_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let engine = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .with_model_file(&dir.path().join("missing.json"))
            .build()
            .unwrap();
        assert!(!engine.has_learned_reranker());
    }

    #[tokio::test]
    async fn test_llm_rerank_requires_enabled_config() {
        let provider = Arc::new(MockCompletionProvider::with_response("[]"));
        let engine = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .with_completion_provider(provider.clone())
            .build()
            .unwrap();
        assert!(!engine.rerank_chain().has(StrategyKind::External));

        let mut config = EngineConfig::default();
        config.external.enabled = true;
        let engine = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .with_config(config)
            .with_completion_provider(provider)
            .build()
            .unwrap();
        assert!(engine.rerank_chain().has(StrategyKind::External));
    }

    #[tokio::test]
    async fn test_ensemble_llm_rerank_of_fused_list() {
        let mut config = EngineConfig::default();
        config.external.enabled = true;
        config.external.max_attempts = 1;
        config.ensemble.llm_rerank = true;
        let reply = r#"["https://www.shl.com/products/product-catalog/view/opq32r/"]"#;
        let engine = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .with_config(config)
            .with_completion_provider(Arc::new(MockCompletionProvider::with_response(reply)))
            .build()
            .unwrap();

        let ranking = engine
            .rank("java developer", 3, RetrievalStrategy::Ensemble, true)
            .await
            .unwrap();
        assert_eq!(ranking.reranked_by, Some(StrategyKind::External));
        assert_eq!(ranking.candidates[0].item.name, "OPQ Personality");
    }

    #[tokio::test]
    async fn test_ensemble_survives_failing_alternate_space() {
        let index = VectorIndex::from_vectors(DIM, vec![vec![1.0; DIM]; 3]).unwrap();
        let engine = EngineBuilder::new(corpus().await, Arc::new(MockEmbeddingProvider::new(DIM)))
            .with_alternate_space(Arc::new(Unavailable), index)
            .build()
            .unwrap();
        let ranking = engine
            .rank("java developer 30 minutes", 3, RetrievalStrategy::Ensemble, true)
            .await
            .unwrap();
        assert_eq!(ranking.candidates.len(), 3);
        assert!(is_sorted_by_score(&ranking.candidates, ScoreField::Ensemble));
        assert_eq!(ranking.reranked_by, None);
    }

    #[test]
    fn test_ensemble_run_reports_upstream_when_all_fail() {
        let mut run = EnsembleRun::new(4);
        run.record(EnsembleStrategy::Hybrid, Err(Error::upstream("down")));
        run.record(EnsembleStrategy::Semantic, Err(Error::upstream("down")));
        assert!(run.finish().unwrap_err().is_upstream());

        let mut run = EnsembleRun::new(4);
        run.record(EnsembleStrategy::Hybrid, Err(Error::upstream("down")));
        run.record(EnsembleStrategy::Semantic, Ok(Vec::new()));
        assert_eq!(run.finish().unwrap().len(), 1);
    }
}
