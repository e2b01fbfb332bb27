//! Labeled queries and training-set assembly for the learned reranker.
//!
//! Labeled queries come from a CSV file with `Query` and `Assessment_url`
//! columns, one row per relevant URL. Rows sharing a query are grouped, in
//! first-seen order.
//!
//! A [`TrainingSet`] accumulates `(features, label)` pairs per query: a
//! candidate is positive when its identity set intersects any of the
//! query's relevant identity sets.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use assessa_core::{
    Candidate, CatalogItem, Error, IdentitySet, LearnedRerankConfig, QuerySignals, Result,
};

use crate::features::{FEATURE_COUNT, FeatureExtractor};
use crate::gbdt::{GbdtParams, GradientBoostedTrees};
use crate::model::{RelevanceModel, TrainingSummary};

/// A query with its known-relevant catalog URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledQuery {
    /// Query text.
    pub query: String,
    /// Relevant URLs, deduplicated, in file order.
    pub relevant_urls: Vec<String>,
}

impl LabeledQuery {
    /// Create a labeled query.
    pub fn new(query: impl Into<String>, relevant_urls: Vec<String>) -> Self {
        Self {
            query: query.into(),
            relevant_urls,
        }
    }

    /// Identity sets of the relevant URLs.
    pub fn relevant_sets(&self) -> Vec<IdentitySet> {
        self.relevant_urls
            .iter()
            .map(|url| IdentitySet::from_url(url))
            .collect()
    }

    /// Whether `item` is one of the relevant entities.
    pub fn is_relevant(&self, item: &CatalogItem) -> bool {
        let identity = item.identity();
        self.relevant_sets().iter().any(|r| r.intersects(&identity))
    }
}

#[derive(Debug, Deserialize)]
struct LabelRow {
    #[serde(rename = "Query")]
    query: String,
    #[serde(rename = "Assessment_url")]
    url: String,
}

/// Parse labeled queries from CSV.
pub fn parse_labeled_queries<R: Read>(reader: R) -> Result<Vec<LabeledQuery>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut queries: Vec<LabeledQuery> = Vec::new();
    for (line, row) in csv.deserialize::<LabelRow>().enumerate() {
        let row = row.map_err(|e| Error::parse(format!("labeled query row {}: {e}", line + 2)))?;
        if row.query.is_empty() || row.url.is_empty() {
            log::warn!("Skipping incomplete labeled query row {}", line + 2);
            continue;
        }
        match queries.iter_mut().find(|q| q.query == row.query) {
            Some(existing) => {
                if !existing.relevant_urls.contains(&row.url) {
                    existing.relevant_urls.push(row.url);
                }
            }
            None => queries.push(LabeledQuery::new(row.query, vec![row.url])),
        }
    }
    Ok(queries)
}

/// Load labeled queries from a CSV file.
pub fn load_labeled_queries(path: &Path) -> Result<Vec<LabeledQuery>> {
    let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
    let queries = parse_labeled_queries(file)?;
    if queries.is_empty() {
        return Err(Error::empty(format!(
            "no labeled queries in {}",
            path.display()
        )));
    }
    log::info!("Loaded {} labeled queries from {}", queries.len(), path.display());
    Ok(queries)
}

/// Accumulated `(features, label)` pairs.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    rows: Vec<[f32; FEATURE_COUNT]>,
    labels: Vec<bool>,
    queries: usize,
}

impl TrainingSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Label and add the candidates retrieved for one query.
    pub fn add_query(
        &mut self,
        labeled: &LabeledQuery,
        signals: &QuerySignals,
        candidates: &[Candidate],
    ) {
        let relevant = labeled.relevant_sets();
        let extractor = FeatureExtractor::new(signals);
        let mut matched = BTreeSet::new();

        for candidate in candidates {
            let identity = candidate.item.identity();
            let mut positive = false;
            for (i, set) in relevant.iter().enumerate() {
                if set.intersects(&identity) {
                    matched.insert(i);
                    positive = true;
                }
            }
            self.rows.push(extractor.extract(candidate));
            self.labels.push(positive);
        }
        self.queries += 1;

        log::debug!(
            "Labeled query '{}': {}/{} relevant items retrieved in {} candidates",
            labeled.query,
            matched.len(),
            relevant.len(),
            candidates.len()
        );
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no pairs were added.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positive pairs.
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }

    /// Negative pairs.
    pub fn negatives(&self) -> usize {
        self.len() - self.positives()
    }

    /// Counts for the model artifact.
    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            queries: self.queries,
            samples: self.len(),
            positives: self.positives(),
            negatives: self.negatives(),
        }
    }

    /// Fit a relevance model.
    ///
    /// Positives are weighted by `negatives / positives` to offset class
    /// imbalance. Fewer than `min_positive_samples` positives is
    /// [`Error::TrainingDataInsufficient`].
    pub fn fit(&self, config: &LearnedRerankConfig) -> Result<RelevanceModel> {
        let positives = self.positives();
        let required = config.min_positive_samples.max(1);
        if positives < required {
            return Err(Error::TrainingDataInsufficient {
                positives,
                required,
            });
        }

        let negatives = self.negatives();
        let positive_weight = if negatives > 0 {
            negatives as f32 / positives as f32
        } else {
            1.0
        };
        let weights: Vec<f32> = self
            .labels
            .iter()
            .map(|&l| if l { positive_weight } else { 1.0 })
            .collect();

        let params = GbdtParams::from(config);
        log::info!(
            "Fitting relevance model: {} samples ({positives} positive, {negatives} negative), {} rounds",
            self.len(),
            params.rounds
        );
        let classifier = GradientBoostedTrees::fit(&self.rows, &self.labels, &weights, &params)?;
        Ok(RelevanceModel::new(classifier, params, self.summary()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const CSV: &str = "\
Query,Assessment_url
Java developer,https://www.shl.com/solutions/products/product-catalog/view/core-java-advanced/
Java developer,https://www.shl.com/products/product-catalog/view/automata-fix/
Sales role, https://www.shl.com/products/product-catalog/view/entry-level-sales/
Java developer,https://www.shl.com/solutions/products/product-catalog/view/core-java-advanced/
,https://www.shl.com/products/product-catalog/view/orphan/
";

    #[test]
    fn test_parse_groups_rows_by_query() {
        let queries = parse_labeled_queries(CSV.as_bytes()).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].query, "Java developer");
        assert_eq!(queries[0].relevant_urls.len(), 2);
        assert_eq!(queries[1].query, "Sales role");
        assert!(queries[1].relevant_urls[0].starts_with("https://"));
    }

    #[test]
    fn test_parse_rejects_missing_columns() {
        assert!(parse_labeled_queries("Question,Link\na,b\n".as_bytes()).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(load_labeled_queries(&path).unwrap().len(), 2);

        std::fs::write(&path, "Query,Assessment_url\n").unwrap();
        assert!(matches!(load_labeled_queries(&path), Err(Error::EmptyResult(_))));
    }

    #[test]
    fn test_relevance_uses_identity_sets() {
        let labeled = LabeledQuery::new(
            "q",
            vec!["https://www.shl.com/products/product-catalog/view/core-java-advanced/".into()],
        );
        let item = CatalogItem::new(
            "https://www.shl.com/solutions/products/product-catalog/view/core-java-advanced/",
            "Core Java Advanced",
        );
        assert!(labeled.is_relevant(&item));
        let other = CatalogItem::new("https://www.shl.com/products/product-catalog/view/opq/", "OPQ");
        assert!(!labeled.is_relevant(&other));
    }

    fn candidates(relevant: usize, total: usize) -> (LabeledQuery, Vec<Candidate>) {
        let urls: Vec<String> = (0..relevant)
            .map(|i| format!("https://x.com/view/item-{i}"))
            .collect();
        let candidates = (0..total)
            .map(|i| {
                let item = CatalogItem::new(format!("https://x.com/view/item-{i}"), format!("Item {i}"));
                Candidate::new(i, Arc::new(item), if i < relevant { 0.9 } else { 0.1 })
            })
            .collect();
        (LabeledQuery::new("q", urls), candidates)
    }

    #[test]
    fn test_add_query_labels_candidates() {
        let (labeled, cands) = candidates(3, 10);
        let mut set = TrainingSet::new();
        set.add_query(&labeled, &QuerySignals::from_text("q"), &cands);
        assert_eq!(set.len(), 10);
        assert_eq!(set.positives(), 3);
        assert_eq!(set.negatives(), 7);
        assert_eq!(set.summary().queries, 1);
    }

    #[test]
    fn test_fit_requires_enough_positives() {
        let (labeled, cands) = candidates(3, 10);
        let mut set = TrainingSet::new();
        set.add_query(&labeled, &QuerySignals::from_text("q"), &cands);
        let err = set.fit(&LearnedRerankConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::TrainingDataInsufficient {
                positives: 3,
                required: 5
            }
        ));
    }

    #[test]
    fn test_fit_produces_usable_model() {
        let (labeled, cands) = candidates(6, 30);
        let mut set = TrainingSet::new();
        set.add_query(&labeled, &QuerySignals::from_text("q"), &cands);
        let config = LearnedRerankConfig {
            rounds: 20,
            max_depth: 3,
            ..LearnedRerankConfig::default()
        };
        let model = set.fit(&config).unwrap();
        model.validate().unwrap();
        assert_eq!(model.summary().positives, 6);

        let signals = QuerySignals::from_text("q");
        let extractor = FeatureExtractor::new(&signals);
        let high = model.predict_relevance_probability(&extractor.extract(&cands[0]));
        let low = model.predict_relevance_probability(&extractor.extract(&cands[20]));
        assert!(high > low);
    }
}
