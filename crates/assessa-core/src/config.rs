//! Engine configuration.
//!
//! Every weight, penalty, depth and timeout the ranking pipeline uses lives
//! here so that none of them is a magic number in stage code. All sections
//! deserialize with per-field defaults, so a partial TOML table overrides only
//! what it names.
//!
//! # Example
//!
//! ```toml
//! [retrieval]
//! search_depth = 200
//!
//! [filter]
//! duration_tolerance = 0.25
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Top level
// ============================================================================

/// Configuration for the whole ranking pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Vector retrieval depths and timeouts.
    pub retrieval: RetrievalConfig,
    /// Hybrid scorer weights.
    pub scoring: ScoringWeights,
    /// Weights for the keyword-only ensemble strategy. Fields missing from
    /// a `[keyword_only]` table keep the [`ScoringWeights::keyword_only`]
    /// preset, not the hybrid defaults.
    #[serde(deserialize_with = "deserialize_keyword_only")]
    pub keyword_only: ScoringWeights,
    /// Soft filter penalties.
    pub filter: FilterConfig,
    /// Rule-based reranker bonuses.
    pub rules: RuleBonuses,
    /// Ensemble fusion parameters.
    pub ensemble: EnsembleConfig,
    /// Learned reranker training parameters.
    pub learned: LearnedRerankConfig,
    /// LLM-assisted reranking.
    pub external: ExternalRerankConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            scoring: ScoringWeights::default(),
            keyword_only: ScoringWeights::keyword_only(),
            filter: FilterConfig::default(),
            rules: RuleBonuses::default(),
            ensemble: EnsembleConfig::default(),
            learned: LearnedRerankConfig::default(),
            external: ExternalRerankConfig::default(),
        }
    }
}

// ============================================================================
// Retrieval
// ============================================================================

/// Vector retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Nearest neighbours fetched from the index per query.
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,

    /// Candidates kept after hybrid scoring.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// The learned reranker sees `top_k * rerank_pool_multiplier` candidates.
    #[serde(default = "default_rerank_pool_multiplier")]
    pub rerank_pool_multiplier: usize,

    /// Result count when the caller does not specify one.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Timeout for a query embedding call, in milliseconds.
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,
}

fn default_search_depth() -> usize {
    150
}

fn default_pool_size() -> usize {
    100
}

fn default_rerank_pool_multiplier() -> usize {
    3
}

fn default_top_k() -> usize {
    10
}

fn default_embedding_timeout_ms() -> u64 {
    5_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_depth: default_search_depth(),
            pool_size: default_pool_size(),
            rerank_pool_multiplier: default_rerank_pool_multiplier(),
            default_top_k: default_top_k(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Weights for lexical and metadata evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Per skill token found in the item name.
    pub skill_in_name: f32,
    /// Per skill token found only in the description.
    pub skill_in_description: f32,
    /// Per role family found in the item name.
    pub role_in_name: f32,
    /// Per role family found only in the description.
    pub role_in_description: f32,
    /// Per skill token present in both the query text and the name.
    pub exact_skill: f32,
    /// Per preferred category the item carries.
    pub category_match: f32,
    /// Per shared non-stopword token between query and name.
    pub token_overlap: f32,
}

impl ScoringWeights {
    /// Weights used by the keyword-only ensemble strategy.
    pub fn keyword_only() -> Self {
        Self {
            skill_in_name: 0.30,
            skill_in_description: 0.10,
            role_in_name: 0.25,
            role_in_description: 0.0,
            exact_skill: 0.15,
            category_match: 0.0,
            token_overlap: 0.0,
        }
    }
}

/// A `ScoringWeights` table where every field is optional.
#[derive(Deserialize)]
struct PartialWeights {
    skill_in_name: Option<f32>,
    skill_in_description: Option<f32>,
    role_in_name: Option<f32>,
    role_in_description: Option<f32>,
    exact_skill: Option<f32>,
    category_match: Option<f32>,
    token_overlap: Option<f32>,
}

impl PartialWeights {
    fn over(self, base: ScoringWeights) -> ScoringWeights {
        ScoringWeights {
            skill_in_name: self.skill_in_name.unwrap_or(base.skill_in_name),
            skill_in_description: self
                .skill_in_description
                .unwrap_or(base.skill_in_description),
            role_in_name: self.role_in_name.unwrap_or(base.role_in_name),
            role_in_description: self.role_in_description.unwrap_or(base.role_in_description),
            exact_skill: self.exact_skill.unwrap_or(base.exact_skill),
            category_match: self.category_match.unwrap_or(base.category_match),
            token_overlap: self.token_overlap.unwrap_or(base.token_overlap),
        }
    }
}

fn deserialize_keyword_only<'de, D>(deserializer: D) -> Result<ScoringWeights, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let partial = PartialWeights::deserialize(deserializer)?;
    Ok(partial.over(ScoringWeights::keyword_only()))
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill_in_name: 0.40,
            skill_in_description: 0.10,
            role_in_name: 0.30,
            role_in_description: 0.10,
            exact_skill: 0.20,
            category_match: 0.20,
            token_overlap: 0.15,
        }
    }
}

// ============================================================================
// Filtering and rules
// ============================================================================

/// Soft filter penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Fractional slack over the duration bound before an item counts as
    /// too long. Shared with the rule-based duration bonus.
    pub duration_tolerance: f32,
    /// Multiplier for items longer than the tolerated bound.
    pub duration_penalty: f32,
    /// Multiplier for items matching none of the preferred categories.
    pub category_penalty: f32,
}

impl FilterConfig {
    /// Longest duration still within tolerance of `bound`.
    pub fn tolerated_duration(&self, bound: u32) -> f32 {
        bound as f32 * (1.0 + self.duration_tolerance)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            duration_tolerance: 0.3,
            duration_penalty: 0.9,
            category_penalty: 0.95,
        }
    }
}

/// Additive bonuses applied by the rule-based reranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleBonuses {
    /// Per skill token in the item name.
    pub skill_in_name: f32,
    /// Per role family in the item name.
    pub role_in_name: f32,
    /// Item duration within tolerance of the bound.
    pub duration_fit: f32,
    /// Per preferred category matched.
    pub category_match: f32,
    /// Entry-level query and entry-level item.
    pub entry_alignment: f32,
    /// Senior query and senior item.
    pub senior_alignment: f32,
    /// Remote query and remote-capable item.
    pub remote: f32,
}

impl Default for RuleBonuses {
    fn default() -> Self {
        Self {
            skill_in_name: 0.30,
            role_in_name: 0.25,
            duration_fit: 0.15,
            category_match: 0.10,
            entry_alignment: 0.10,
            senior_alignment: 0.10,
            remote: 0.05,
        }
    }
}

// ============================================================================
// Ensemble
// ============================================================================

/// Ensemble fusion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Weight of an item's best strategy score.
    pub top_weight: f32,
    /// Weight of its second best strategy score.
    pub second_weight: f32,
    /// Reciprocal rank fusion constant.
    pub rrf_k: f32,
    /// Share of the weighted top score in the final blend.
    pub weighted_share: f32,
    /// Share of the RRF score in the final blend.
    pub rrf_share: f32,
    /// Each strategy contributes `top_k * depth_multiplier` results.
    pub depth_multiplier: usize,
    /// Pass the fused list through the LLM reranker when one is configured.
    pub llm_rerank: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            top_weight: 0.7,
            second_weight: 0.3,
            rrf_k: 60.0,
            weighted_share: 0.7,
            rrf_share: 0.3,
            depth_multiplier: 2,
            llm_rerank: false,
        }
    }
}

// ============================================================================
// Reranking
// ============================================================================

/// Gradient-boosted tree training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnedRerankConfig {
    /// Boosting rounds.
    pub rounds: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Shrinkage applied to each tree.
    pub learning_rate: f32,
    /// L2 regularisation on leaf values.
    pub lambda: f32,
    /// Minimum hessian sum per child.
    pub min_child_weight: f32,
    /// Minimum positives needed to train.
    pub min_positive_samples: usize,
    /// Candidates drawn per labeled query during training.
    pub training_pool: usize,
}

impl Default for LearnedRerankConfig {
    fn default() -> Self {
        Self {
            rounds: 200,
            max_depth: 6,
            learning_rate: 0.1,
            lambda: 1.0,
            min_child_weight: 1.0,
            min_positive_samples: 5,
            training_pool: 50,
        }
    }
}

/// LLM-assisted reranking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalRerankConfig {
    /// Whether the LLM reranker participates in the strategy chain.
    pub enabled: bool,
    /// Timeout for one rerank call, in milliseconds.
    pub timeout_ms: u64,
    /// Candidates included in the prompt.
    pub max_candidates: usize,
    /// Description characters per candidate in the prompt.
    pub description_chars: usize,
    /// Attempts for retryable provider failures.
    pub max_attempts: u32,
}

impl Default for ExternalRerankConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: 10_000,
            max_candidates: 20,
            description_chars: 200,
            max_attempts: 3,
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

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retrieval.search_depth, 150);
        assert_eq!(config.retrieval.pool_size, 100);
        assert_eq!(config.scoring.skill_in_name, 0.40);
        assert_eq!(config.filter.duration_tolerance, 0.3);
        assert_eq!(config.ensemble.rrf_k, 60.0);
        assert_eq!(config.learned.rounds, 200);
        assert!(!config.external.enabled);
    }

    #[test]
    fn test_keyword_only_preset() {
        let config = EngineConfig::default();
        assert_eq!(config.keyword_only, ScoringWeights::keyword_only());
        assert_ne!(config.keyword_only, config.scoring);

        let parsed: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_override() {
        let parsed: EngineConfig = toml::from_str(
            r#"
            [retrieval]
            search_depth = 200

            [filter]
            duration_tolerance = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(parsed.retrieval.search_depth, 200);
        assert_eq!(parsed.retrieval.pool_size, 100);
        assert_eq!(parsed.filter.duration_tolerance, 0.25);
        assert_eq!(parsed.filter.duration_penalty, 0.9);
    }

    #[test]
    fn test_partial_keyword_only_keeps_preset() {
        let parsed: EngineConfig = toml::from_str(
            r#"
            [keyword_only]
            skill_in_name = 0.5
            "#,
        )
        .unwrap();
        let preset = ScoringWeights::keyword_only();
        assert_eq!(parsed.keyword_only.skill_in_name, 0.5);
        assert_eq!(parsed.keyword_only.category_match, preset.category_match);
        assert_eq!(parsed.keyword_only.token_overlap, preset.token_overlap);
        assert_eq!(parsed.keyword_only.role_in_name, preset.role_in_name);
        // The hybrid section still fills from its own defaults.
        assert_eq!(parsed.scoring, ScoringWeights::default());
    }

    #[test]
    fn test_keyword_only_survives_toml_round_trip() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.keyword_only, ScoringWeights::keyword_only());
    }

    #[test]
    fn test_tolerated_duration() {
        let filter = FilterConfig::default();
        assert!((filter.tolerated_duration(20) - 26.0).abs() < 1e-4);
    }
}
