//! Handler functions for the index, query, train, evaluate and health
//! commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assessa_core::{ConfigProvider, Error, Result};
use assessa_engine::{
    Engine, EngineBuilder, EngineHandle, EvaluationReport, Recommendation, RetrievalStrategy,
    evaluate, train_reranker,
};
use assessa_rerank::load_labeled_queries;
use assessa_vector::{
    ALTERNATE_SPACE, CorpusBuildStats, CorpusBuilder, IndexMetadata, catalog_hash,
    create_alternate_provider, create_embedding_provider, is_index_fresh, load_corpus, load_space,
    read_catalog_file, save_corpus, save_space,
};

use crate::config::AssessaConfig;

// ============================================================================
// Option types
// ============================================================================

/// Options for `assessa index`.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Catalog records file; falls back to `catalog_path` in the config.
    pub catalog: Option<String>,
    /// Rebuild even when the stored index matches the catalog.
    pub force: bool,
    /// Only report freshness.
    pub check: bool,
}

/// Options for `assessa query`.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Query text.
    pub text: String,
    /// Result count; falls back to the configured default.
    pub top_k: Option<usize>,
    /// Retrieval strategy.
    pub strategy: RetrievalStrategy,
    /// Allow the learned reranker.
    pub use_learned: bool,
    /// Print JSON instead of a table.
    pub json: bool,
}

/// Options for `assessa evaluate`.
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    /// Labeled queries CSV.
    pub labels: String,
    /// Cutoff; falls back to the configured default.
    pub top_k: Option<usize>,
    /// Retrieval strategy.
    pub strategy: RetrievalStrategy,
    /// Allow the learned reranker.
    pub use_learned: bool,
    /// Print JSON instead of a summary.
    pub json: bool,
}

// ============================================================================
// Engine loading
// ============================================================================

/// Build an [`Engine`] from the persisted index under the configured data dir.
///
/// A stored alternate space is attached only when the config names an
/// alternate model; an unusable alternate space is skipped with a warning.
/// A missing or unusable relevance model leaves the learned reranker off.
pub fn load_engine(config: &AssessaConfig) -> Result<Engine> {
    let dir = config.index_dir()?;
    let (corpus, metadata) = load_corpus(&dir).map_err(missing_index_hint)?;
    if metadata.model != config.vector.model {
        log::warn!(
            "Index at {} was built with model '{}' but config names '{}'",
            dir.display(),
            metadata.model,
            config.vector.model
        );
    }

    let embedder = create_embedding_provider(&config.vector)?;
    let mut builder = EngineBuilder::new(Arc::new(corpus), embedder)
        .with_config(config.engine.clone())
        .with_model_file(&config.model_path()?);

    if let Some(provider) = create_alternate_provider(&config.vector)? {
        let (hash, count) = (metadata.content_hash.clone(), metadata.document_count);
        match load_space(&dir, Some(ALTERNATE_SPACE), &hash, count) {
            Ok((index, _)) => builder = builder.with_alternate_space(provider, index),
            Err(e) => log::warn!("Alternate space unavailable, ensemble runs without it: {e}"),
        }
    }

    builder.build()
}

// ============================================================================
// Handlers
// ============================================================================

/// Embed the catalog and write the index artifacts.
pub async fn handle_index(config: &AssessaConfig, options: IndexOptions) -> Result<()> {
    let catalog_path = config.catalog_file(options.catalog.as_deref())?;
    let items = read_catalog_file(&catalog_path)?;
    let hash = catalog_hash(&items)?;
    let dir = config.index_dir()?;
    let fresh = is_index_fresh(&dir, &hash);

    if options.check {
        if fresh {
            println!("Index is fresh ({} items, hash {hash}).", items.len());
        } else {
            println!("Index is stale or missing; run `assessa index` to rebuild.");
        }
        return Ok(());
    }
    if fresh && !options.force {
        println!("Index is up to date. Use --force to rebuild.");
        return Ok(());
    }

    println!("Indexing {} items from {}", items.len(), catalog_path.display());

    let provider = create_embedding_provider(&config.vector)?;
    let (corpus, stats) = CorpusBuilder::new(Arc::clone(&provider))
        .with_batch_size(config.vector.batch_size)
        .build(items.clone())
        .await?;
    print_build_stats("Primary space", &stats);
    save_corpus(&dir, &corpus, provider.name(), &config.vector.model)?;

    if let (Some(alternate), Some(model)) = (
        create_alternate_provider(&config.vector)?,
        config.vector.alternate_model.as_deref(),
    ) {
        let (space, stats) = CorpusBuilder::new(Arc::clone(&alternate))
            .with_batch_size(config.vector.batch_size)
            .build(items)
            .await?;
        print_build_stats("Alternate space", &stats);
        let metadata =
            IndexMetadata::describe(space.index(), corpus.content_hash(), alternate.name(), model);
        save_space(&dir, Some(ALTERNATE_SPACE), space.index(), &metadata)?;
    }

    println!("\nIndex saved to: {}", dir.display());
    Ok(())
}

/// Rank the catalog for one query and print the results.
pub async fn handle_query(config: &AssessaConfig, options: QueryOptions) -> Result<()> {
    let engine = load_engine(config)?;
    let top_k = options
        .top_k
        .unwrap_or(config.engine.retrieval.default_top_k);

    let results = engine
        .retrieve(&options.text, top_k, options.strategy, options.use_learned)
        .await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No matching assessments.");
    } else {
        print_recommendations(&results);
    }
    Ok(())
}

/// Train the learned reranker and save the model.
pub async fn handle_train(
    config: &AssessaConfig,
    labels: &str,
    output: Option<&str>,
) -> Result<()> {
    let labeled = load_labeled_queries(Path::new(labels))?;
    let engine = load_engine(config)?;
    let model = train_reranker(&engine, &labeled, &config.engine.learned).await?;

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => config.model_path()?,
    };
    model.save(&path)?;

    let summary = model.summary();
    println!("Relevance model trained:");
    println!("  Queries:   {}", summary.queries);
    println!("  Samples:   {}", summary.samples);
    println!("  Positives: {}", summary.positives);
    println!("  Negatives: {}", summary.negatives);
    println!("\nModel saved to: {}", path.display());
    Ok(())
}

/// Measure recall@k against labeled queries.
pub async fn handle_evaluate(config: &AssessaConfig, options: EvaluateOptions) -> Result<()> {
    let labeled = load_labeled_queries(Path::new(&options.labels))?;
    let engine = load_engine(config)?;
    let k = options
        .top_k
        .unwrap_or(config.engine.retrieval.default_top_k);

    let report = evaluate(&engine, &labeled, k, options.strategy, options.use_learned).await?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Load the engine through an [`EngineHandle`] and report its status.
///
/// An engine that cannot be built is reported as failed and returned as an
/// error so the process exits non-zero.
pub async fn handle_health(config: &AssessaConfig) -> Result<()> {
    let handle = EngineHandle::new();
    let outcome = handle.reload(async { load_engine(config) }).await;
    println!("assessa: {}", handle.status().await);

    if let Ok(engine) = handle.current().await {
        println!("  Items:           {}", engine.corpus().len());
        println!("  Embedder:        {}", engine.embedder_name());
        println!("  Alternate space: {}", yes_no(engine.has_alternate_space()));
        println!("  Learned rerank:  {}", yes_no(engine.has_learned_reranker()));
        println!(
            "  Rerank chain:    {}",
            engine
                .rerank_chain()
                .strategies()
                .iter()
                .map(|s| s.kind().to_string())
                .collect::<Vec<_>>()
                .join(" > ")
        );
    }
    outcome
}

// ============================================================================
// Output helpers
// ============================================================================

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn print_build_stats(label: &str, stats: &CorpusBuildStats) {
    println!("{label}:");
    println!("  Documents:   {}", stats.documents_indexed);
    println!("  Dimension:   {}", stats.embedding_dimension);
    println!("  Duration:    {} ms", stats.build_duration_ms);
    if stats.batches_retried > 0 {
        println!("  Retried:     {} batches", stats.batches_retried);
    }
    if !stats.errors.is_empty() {
        println!("  Zero vectors: {}", stats.errors.len());
    }
}

fn print_recommendations(results: &[Recommendation]) {
    for (i, rec) in results.iter().enumerate() {
        let duration = rec
            .duration_minutes
            .map(|m| format!("{m} min"))
            .unwrap_or_else(|| "n/a".to_string());
        let categories = rec
            .categories
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ");
        println!("{:>2}. {} ({duration})", i + 1, rec.name);
        println!("    {}", rec.canonical_url);
        if !categories.is_empty() {
            println!("    {categories}");
        }
        println!(
            "    remote: {}  adaptive: {}",
            yes_no(rec.supports_remote),
            yes_no(rec.supports_adaptive)
        );
    }
}

fn print_report(report: &EvaluationReport) {
    println!(
        "Recall@{} ({}, learned rerank {}):",
        report.k,
        report.strategy,
        if report.use_learned_rerank { "on" } else { "off" }
    );
    for query in &report.queries {
        println!(
            "  {:.3}  {}/{}  {}",
            query.recall, query.found, query.relevant, query.query
        );
    }
    println!("\nMean recall@{}: {:.4}", report.k, report.mean_recall);
}

fn missing_index_hint(err: Error) -> Error {
    match err {
        Error::NotFound(msg) => Error::not_found(format!("{msg}; run `assessa index` first")),
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assessa_core::CatalogItem;

    fn items() -> Vec<CatalogItem> {
        ["Core Java Advanced", "Entry Level Sales", "OPQ Personality"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                CatalogItem::new(
                    format!("https://www.shl.com/products/product-catalog/view/item-{i}/"),
                    *name,
                )
                .with_duration(20 + 10 * i as u32)
            })
            .collect()
    }

    fn setup(alternate: bool) -> (tempfile::TempDir, AssessaConfig) {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = dir.path().join("catalog-input.json");
        std::fs::write(&catalog, serde_json::to_string(&items()).unwrap()).unwrap();

        let mut config = AssessaConfig {
            data_dir: Some(dir.path().join("data").to_string_lossy().into_owned()),
            catalog_path: Some(catalog.to_string_lossy().into_owned()),
            ..Default::default()
        };
        config.vector.mock_dimension = 16;
        if alternate {
            config.vector.alternate_model = Some("alt-model".into());
        }
        (dir, config)
    }

    #[tokio::test]
    async fn test_index_then_load_engine() {
        let (_dir, config) = setup(false);
        handle_index(&config, IndexOptions::default()).await.unwrap();

        let engine = load_engine(&config).unwrap();
        assert_eq!(engine.corpus().len(), 3);
        assert!(!engine.has_alternate_space());
        assert!(!engine.has_learned_reranker());
    }

    #[tokio::test]
    async fn test_index_writes_alternate_space() {
        let (_dir, config) = setup(true);
        handle_index(&config, IndexOptions::default()).await.unwrap();

        let index_dir = config.index_dir().unwrap();
        assert!(index_dir.join("vectors-alternate.json").exists());
        let engine = load_engine(&config).unwrap();
        assert!(engine.has_alternate_space());
    }

    #[tokio::test]
    async fn test_index_freshness() {
        let (_dir, config) = setup(false);
        let index_dir = config.index_dir().unwrap();

        handle_index(&config, IndexOptions { check: true, ..Default::default() })
            .await
            .unwrap();
        assert!(!index_dir.exists());

        handle_index(&config, IndexOptions::default()).await.unwrap();
        let first = std::fs::metadata(index_dir.join("vectors.json"))
            .unwrap()
            .modified()
            .unwrap();

        // Fresh index without --force is left alone.
        handle_index(&config, IndexOptions::default()).await.unwrap();
        let second = std::fs::metadata(index_dir.join("vectors.json"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_index_requires_catalog() {
        let (_dir, mut config) = setup(false);
        config.catalog_path = None;
        let err = handle_index(&config, IndexOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_query_without_index_is_not_found() {
        let (_dir, config) = setup(false);
        let err = load_engine(&config).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(err.to_string().contains("assessa index"));
    }

    #[tokio::test]
    async fn test_query_and_evaluate() {
        let (dir, config) = setup(false);
        handle_index(&config, IndexOptions::default()).await.unwrap();

        handle_query(
            &config,
            QueryOptions {
                text: "Java developer".into(),
                top_k: Some(2),
                strategy: RetrievalStrategy::Ensemble,
                use_learned: true,
                json: true,
            },
        )
        .await
        .unwrap();

        let labels = dir.path().join("labels.csv");
        std::fs::write(
            &labels,
            "Query,Assessment_url\n\
             Java developer,https://www.shl.com/products/product-catalog/view/item-0/\n",
        )
        .unwrap();
        handle_evaluate(
            &config,
            EvaluateOptions {
                labels: labels.to_string_lossy().into_owned(),
                top_k: Some(3),
                strategy: RetrievalStrategy::Hybrid,
                use_learned: false,
                json: false,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_health_reports_failure_without_index() {
        let (_dir, config) = setup(false);
        assert!(handle_health(&config).await.is_err());

        handle_index(&config, IndexOptions::default()).await.unwrap();
        handle_health(&config).await.unwrap();
    }
}
