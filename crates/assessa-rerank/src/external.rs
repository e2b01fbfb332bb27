//! LLM-assisted reranking.
//!
//! The query and the head of the candidate list are rendered into a prompt
//! asking a completion model for a JSON array of URLs in relevance order.
//! The reply is parsed leniently:
//!
//! 1. Markdown code fences are stripped
//! 2. The text is parsed as a JSON array of strings
//! 3. Failing that, every `http(s)://` URL in the text is taken in order
//!
//! URLs are mapped back to candidates by identity set, so either catalog
//! path convention (or an alternate URL) resolves to the same item.
//! Candidates the model did not mention keep their incoming order after the
//! ranked ones.

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

use assessa_core::{Candidate, ExternalRerankConfig, QuerySignals};

use crate::llm::{CompletionProvider, CompletionRequest, RetryWrapper};
use crate::strategy::RerankFailure;

#[allow(clippy::expect_used)]
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s,\]"'`]+"#).expect("URL pattern is valid"));

const SYSTEM_PROMPT: &str = "You are an expert assessment recommendation system. \
Rank candidate assessments by relevance to a hiring query.";

/// Reranks candidates with a completion model.
#[derive(Clone)]
pub struct LlmReranker {
    provider: Arc<dyn CompletionProvider>,
    config: ExternalRerankConfig,
}

impl std::fmt::Debug for LlmReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmReranker")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl LlmReranker {
    /// Create a reranker. When `config.max_attempts` is above one, the
    /// provider is wrapped in a [`RetryWrapper`].
    pub fn new(provider: Arc<dyn CompletionProvider>, config: ExternalRerankConfig) -> Self {
        let provider: Arc<dyn CompletionProvider> = if config.max_attempts > 1 {
            Arc::new(RetryWrapper::new(provider).with_max_attempts(config.max_attempts))
        } else {
            provider
        };
        Self { provider, config }
    }

    /// Provider name.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Render the ranking prompt.
    pub fn build_prompt(&self, query: &str, candidates: &[Candidate], top_k: usize) -> String {
        let mut listing = String::new();
        for (i, candidate) in candidates.iter().take(self.config.max_candidates).enumerate() {
            let item = &candidate.item;
            let categories = if item.categories.is_empty() {
                "Unknown".to_string()
            } else {
                item.categories
                    .iter()
                    .map(|c| c.label().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(listing, "{}. {}", i + 1, item.name);
            let _ = writeln!(
                listing,
                "   Description: {}",
                truncate_chars(&item.description, self.config.description_chars)
            );
            let _ = writeln!(listing, "   Test Types: {categories}");
            if let Some(minutes) = item.duration_minutes {
                let _ = writeln!(listing, "   Duration: {minutes} minutes");
            }
            let _ = writeln!(listing, "   URL: {}\n", item.canonical_url);
        }

        format!(
            "Given a user query and a list of candidate assessments, rank them by relevance to the query.\n\
             Consider:\n\
             - Technical skills mentioned (Java, Python, SQL, etc.)\n\
             - Job roles (developer, analyst, manager, etc.)\n\
             - Experience level (entry-level, senior, etc.)\n\
             - Duration constraints\n\
             - Test types (Knowledge & Skills, Personality, Ability & Aptitude, etc.)\n\n\
             User Query: {query}\n\n\
             Candidate Assessments:\n{listing}\n\
             Return ONLY a JSON array of URLs in descending relevance order (most relevant first).\n\
             Format: [\"url1\", \"url2\", \"url3\", ...]\n\
             Return exactly {top_k} URLs, ranked from most relevant to least relevant.\n"
        )
    }

    /// Ask the model for an ordering and apply it.
    ///
    /// Fails on timeout, provider error, or a reply that maps to no
    /// candidate. The result holds at most `top_k` candidates with
    /// `rerank_score` descending from 1.
    pub async fn rerank(
        &self,
        signals: &QuerySignals,
        candidates: &[Candidate],
        top_k: usize,
    ) -> Result<Vec<Candidate>, RerankFailure> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = self.build_prompt(&signals.raw_text, candidates, top_k);
        let request = CompletionRequest::new(prompt)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_temperature(0.1);

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| RerankFailure::Timeout {
                after_ms: self.config.timeout_ms,
            })?
            .map_err(|e| RerankFailure::Provider(e.to_string()))?;

        log::debug!(
            "LLM rerank via {} used {} tokens",
            self.provider.name(),
            response.tokens_used.total()
        );

        let urls = parse_ranked_urls(&response.content);
        apply_ranking(candidates, &urls, top_k)
    }
}

/// Order `candidates` by `urls`, filling the rest in incoming order.
pub fn apply_ranking(
    candidates: &[Candidate],
    urls: &[String],
    top_k: usize,
) -> Result<Vec<Candidate>, RerankFailure> {
    let identities: Vec<_> = candidates.iter().map(|c| c.item.identity()).collect();
    let mut taken = vec![false; candidates.len()];
    let mut order = Vec::with_capacity(candidates.len());

    for url in urls {
        let hit = identities
            .iter()
            .enumerate()
            .find(|(i, identity)| !taken[*i] && identity.contains_url(url));
        if let Some((i, _)) = hit {
            taken[i] = true;
            order.push(i);
        }
    }

    if order.is_empty() {
        return Err(RerankFailure::UnmappedResponse(format!(
            "{} URLs in reply, none matched a candidate",
            urls.len()
        )));
    }
    let mapped = order.len();
    order.extend((0..candidates.len()).filter(|i| !taken[*i]));

    let total = order.len() as f32;
    let ranked = order
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(rank, i)| {
            let mut candidate = candidates[i].clone();
            candidate.rerank_score = 1.0 - rank as f32 / total;
            candidate
        })
        .collect();
    log::debug!("LLM rerank mapped {mapped} of {} candidates", candidates.len());
    Ok(ranked)
}

/// Extract the ranked URL list from a model reply.
pub fn parse_ranked_urls(reply: &str) -> Vec<String> {
    let body = strip_code_fences(reply);
    if let Ok(urls) = serde_json::from_str::<Vec<String>>(body) {
        return urls;
    }
    URL_RE
        .find_iter(body)
        .map(|m| m.as_str().trim_end_matches(['.', ')', ';']).to_string())
        .collect()
}

fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !trimmed.contains("```") {
        return trimmed;
    }
    trimmed
        .split("```")
        .map(|part| part.trim_start_matches("json").trim())
        .find(|part| part.starts_with('[') || part.starts_with('{'))
        .unwrap_or(trimmed)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::llm::MockCompletionProvider;
    use assessa_core::{CatalogItem, Category, ScoreField, is_sorted_by_score};

    const BASE: &str = "https://www.shl.com/solutions/products/product-catalog/view/";

    fn candidates() -> Vec<Candidate> {
        ["core-java-advanced", "entry-level-sales", "opq"]
            .iter()
            .enumerate()
            .map(|(i, slug)| {
                let item = CatalogItem::new(format!("{BASE}{slug}/"), slug.replace('-', " "))
                    .with_description("x".repeat(300))
                    .with_duration(20)
                    .with_category(Category::Knowledge);
                Candidate::new(i, Arc::new(item), 0.5)
            })
            .collect()
    }

    fn config() -> ExternalRerankConfig {
        ExternalRerankConfig {
            enabled: true,
            max_attempts: 1,
            ..ExternalRerankConfig::default()
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let urls = parse_ranked_urls(r#"["https://a.com/view/x", "https://a.com/view/y"]"#);
        assert_eq!(urls, vec!["https://a.com/view/x", "https://a.com/view/y"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n[\"https://a.com/view/x\"]\n```\n";
        assert_eq!(parse_ranked_urls(reply), vec!["https://a.com/view/x"]);
    }

    #[test]
    fn test_parse_falls_back_to_url_scan() {
        let reply = "1. https://a.com/view/x, then https://a.com/view/y.";
        assert_eq!(
            parse_ranked_urls(reply),
            vec!["https://a.com/view/x", "https://a.com/view/y"]
        );
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_prompt_contents() {
        let reranker = LlmReranker::new(Arc::new(MockCompletionProvider::with_response("[]")), config());
        let prompt = reranker.build_prompt("Java developer", &candidates(), 2);
        assert!(prompt.contains("User Query: Java developer"));
        assert!(prompt.contains("1. core java advanced"));
        assert!(prompt.contains("Duration: 20 minutes"));
        assert!(prompt.contains("Test Types: Knowledge & Skills"));
        assert!(prompt.contains("Return exactly 2 URLs"));
        assert!(!prompt.contains(&"x".repeat(201)));
    }

    #[test]
    fn test_apply_ranking_maps_mirror_urls() {
        let urls = vec![
            "https://www.shl.com/products/product-catalog/view/opq/".to_string(),
            "https://unknown.com/view/nothing".to_string(),
        ];
        let ranked = apply_ranking(&candidates(), &urls, 3).unwrap();
        let order: Vec<usize> = ranked.iter().map(|c| c.position).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert!(is_sorted_by_score(&ranked, ScoreField::Rerank));
    }

    #[test]
    fn test_apply_ranking_unmapped_fails() {
        let urls = vec!["https://unknown.com/view/nothing".to_string()];
        assert!(matches!(
            apply_ranking(&candidates(), &urls, 3),
            Err(RerankFailure::UnmappedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_rerank_with_mock_provider() {
        let reply = format!("```json\n[\"{BASE}entry-level-sales/\"]\n```");
        let provider = MockCompletionProvider::with_response(reply);
        let reranker = LlmReranker::new(Arc::new(provider.clone()), config());
        let signals = QuerySignals::from_text("sales");
        let ranked = reranker.rerank(&signals, &candidates(), 2).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].position, 1);
        assert_eq!(ranked[1].position, 0);

        let sent = provider.last_request().await.unwrap();
        assert!(sent.prompt.contains("User Query: sales"));
        assert_eq!(sent.system_prompt.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(sent.temperature, Some(0.1));
    }

    #[tokio::test]
    async fn test_provider_error_is_failure() {
        let reranker = LlmReranker::new(Arc::new(MockCompletionProvider::rejecting()), config());
        let result = reranker.rerank(&QuerySignals::from_text("q"), &candidates(), 2).await;
        assert!(matches!(result, Err(RerankFailure::Provider(_))));
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl CompletionProvider for Stalled {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> assessa_core::Result<crate::llm::CompletionResponse> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_failure() {
        let reranker = LlmReranker::new(Arc::new(Stalled), config());
        let result = reranker.rerank(&QuerySignals::from_text("q"), &candidates(), 2).await;
        assert!(matches!(result, Err(RerankFailure::Timeout { after_ms: 10_000 })));
    }
}
