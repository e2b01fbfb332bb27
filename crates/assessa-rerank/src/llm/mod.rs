//! LLM completion abstractions used by the LLM reranker.

mod mock;
mod provider;
mod retry;

pub use mock::MockCompletionProvider;
pub use provider::{
    CompletionProvider, CompletionRequest, CompletionResponse, StopReason, TokenUsage,
};
pub use retry::RetryWrapper;
