//! Scripted completion provider for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use assessa_core::{Error, Result};

use super::provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, StopReason, TokenUsage,
};

/// One scripted outcome.
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Unavailable(String),
    Rejected(String),
}

/// Mock provider that replays scripted outcomes.
///
/// Outcomes are consumed in order; once only one remains it is repeated.
/// Requests are recorded so tests can inspect the prompt.
#[derive(Clone)]
pub struct MockCompletionProvider {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    script: VecDeque<Scripted>,
    requests: Vec<CompletionRequest>,
}

impl MockCompletionProvider {
    fn scripted(script: Vec<Scripted>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script: script.into(),
                requests: Vec::new(),
            })),
        }
    }

    /// Always reply with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::scripted(vec![Scripted::Reply(response.into())])
    }

    /// Reply with each response in turn.
    pub fn new(responses: Vec<String>) -> Self {
        Self::scripted(responses.into_iter().map(Scripted::Reply).collect())
    }

    /// Fail `failures` times with a retryable error, then reply.
    pub fn flaky(failures: usize, response: impl Into<String>) -> Self {
        let mut script: Vec<Scripted> = (0..failures)
            .map(|i| Scripted::Unavailable(format!("scripted outage {}", i + 1)))
            .collect();
        script.push(Scripted::Reply(response.into()));
        Self::scripted(script)
    }

    /// Always fail with a retryable error.
    pub fn unavailable() -> Self {
        Self::scripted(vec![Scripted::Unavailable("scripted outage".into())])
    }

    /// Always fail with a non-retryable error.
    pub fn rejecting() -> Self {
        Self::scripted(vec![Scripted::Rejected("scripted rejection".into())])
    }

    /// Number of requests received.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// The most recent request.
    pub async fn last_request(&self) -> Option<CompletionRequest> {
        self.state.lock().await.requests.last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut state = self.state.lock().await;
        state.requests.push(request);

        let outcome = if state.script.len() > 1 {
            state.script.pop_front()
        } else {
            state.script.front().cloned()
        };

        match outcome {
            Some(Scripted::Reply(content)) => Ok(CompletionResponse {
                content,
                tokens_used: TokenUsage {
                    input: 10, // Mock values
                    output: 20,
                },
                stop_reason: StopReason::EndTurn,
            }),
            Some(Scripted::Unavailable(msg)) => Err(Error::upstream(msg)),
            Some(Scripted::Rejected(msg)) => Err(Error::invalid_data(msg)),
            None => Err(Error::operation("mock provider has no scripted responses")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
