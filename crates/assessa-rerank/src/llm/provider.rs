//! Completion provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use assessa_core::Result;

/// Abstraction over LLM completion services.
///
/// The LLM reranker only needs a single non-streaming completion; hosts
/// plug in a concrete backend. Transport failures should surface as
/// [`assessa_core::Error::UpstreamUnavailable`] so retry wrappers can tell
/// them apart from malformed requests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Completes a prompt and returns the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// A single-turn ranking prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Instructions sent ahead of the prompt.
    pub system_prompt: Option<String>,
    /// Rendered query and candidate list.
    pub prompt: String,
    /// A ranked URL list for twenty candidates fits well inside this.
    pub max_tokens: u32,
    /// Sampling temperature; provider default when unset.
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Request for `prompt` with no system prompt and provider temperature.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Completion text plus accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Token accounting.
    pub tokens_used: TokenUsage,
    /// Why generation ended.
    pub stop_reason: StopReason,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed.
    pub input: u64,
    /// Output tokens generated.
    pub output: u64,
}

impl TokenUsage {
    /// Input plus output.
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// Why generation ended. A `MaxTokens` stop may leave a truncated array,
/// which the URL fallback in the reranker still reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StopReason {
    /// Natural end of the reply.
    EndTurn,
    /// Hit `max_tokens`.
    MaxTokens,
    /// Hit a stop sequence.
    StopSequence,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("Rank these")
            .with_system_prompt("You rank assessments")
            .with_temperature(0.1);

        assert_eq!(request.prompt, "Rank these");
        assert_eq!(request.system_prompt.as_deref(), Some("You rank assessments"));
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, 1024);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input: 120,
            output: 30,
        };
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_stop_reason_serializes_snake_case() {
        let json = serde_json::to_string(&StopReason::MaxTokens).unwrap();
        assert_eq!(json, "\"max_tokens\"");
    }
}
