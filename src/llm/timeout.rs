//! Deadline wrapper around any provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Applies an explicit deadline to every completion call.
///
/// An expired deadline surfaces as `LlmError::Timeout`, which callers can
/// treat as retryable.
pub struct TimeoutProvider {
    inner: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl LlmProvider for TimeoutProvider {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    model = self.inner.model_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "LLM call timed out"
                );
                Err(LlmError::Timeout {
                    provider: self.inner.model_name().to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
