//! Retry wrapper for completion providers.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;

use assessa_core::{Error, Result};

use super::provider::{CompletionProvider, CompletionRequest, CompletionResponse};

/// Wraps a completion provider with exponential-backoff retries.
///
/// Only errors that report [`Error::is_retryable`] are retried.
pub struct RetryWrapper {
    inner: Arc<dyn CompletionProvider>,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryWrapper {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max attempts: 3
    /// - Initial delay: 1 second
    /// - Max delay: 10 seconds
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            inner: provider,
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Sets the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }
}

#[async_trait]
impl CompletionProvider for RetryWrapper {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        // backon counts retries, not attempts.
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize);

        let provider = self.inner.clone();

        (|| async { provider.complete(request.clone()).await })
            .retry(backoff)
            .when(Self::should_retry)
            .notify(|err: &Error, after: Duration| {
                log::warn!(
                    "Completion via {} failed, retrying in {after:?}: {err}",
                    self.inner.name()
                );
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
