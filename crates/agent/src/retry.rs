use async_trait::async_trait;
use tracing::warn;

use triad_core::config::LlmConfig;

use crate::llm::{LlmClient, LlmError, LlmRequest, LlmResponse};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay_ms: 1_000, max_delay_ms: 8_000 }
    }
}

impl From<&LlmConfig> for RetryConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_delay_ms: config.retry_initial_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt that follows `attempt` (1-based): doubles each time,
    /// capped at `max_delay_ms`.
    pub fn delay_after(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(32);
        self.initial_delay_ms.saturating_mul(1_u64 << exponent).min(self.max_delay_ms)
    }
}

pub struct RetryingClient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: LlmClient> RetryingClient<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for RetryingClient<C> {
    async fn send(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::EmptyMessages);
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.send(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt >= max_attempts || !error.is_retryable() => {
                    return Err(error);
                }
                Err(error) => {
                    let delay_ms = self.config.delay_after(attempt);
                    warn!(
                        event_name = "llm.request.retrying",
                        attempt,
                        max_attempts,
                        delay_ms,
                        error = %error,
                        "retrying LLM request"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryConfig, RetryingClient};
    use crate::llm::{LlmClient, LlmError, LlmRequest};
    use crate::testing::ScriptedLlm;
    use triad_core::domain::conversation::ConversationTurn;

    fn fast() -> RetryConfig {
        RetryConfig { max_attempts: 3, initial_delay_ms: 1, max_delay_ms: 2 }
    }

    fn request() -> LlmRequest {
        LlmRequest::new(vec![ConversationTurn::user("hello")], "system", 64)
    }

    #[test]
    fn delay_doubles_until_capped() {
        let config = RetryConfig { max_attempts: 5, initial_delay_ms: 1_000, max_delay_ms: 3_000 };
        assert_eq!(config.delay_after(1), 1_000);
        assert_eq!(config.delay_after(2), 2_000);
        assert_eq!(config.delay_after(3), 3_000);
        assert_eq!(config.delay_after(40), 3_000);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let llm = ScriptedLlm::new();
        llm.push_error(LlmError::Status { status: 503, body: "overloaded".to_string() });
        llm.push_error(LlmError::Transport("reset".to_string()));
        llm.push_text("finally");
        let client = RetryingClient::new(llm.clone(), fast());

        let response = client.send(request()).await.expect("third attempt succeeds");

        assert_eq!(response.text(), "finally");
        assert_eq!(llm.request_count(), 3);
    }

    #[tokio::test]
    async fn client_errors_surface_without_retry() {
        let llm = ScriptedLlm::new();
        llm.push_error(LlmError::Status { status: 400, body: "bad request".to_string() });
        llm.push_text("never reached");
        let client = RetryingClient::new(llm.clone(), fast());

        let error = client.send(request()).await.expect_err("4xx is final");

        assert!(matches!(error, LlmError::Status { status: 400, .. }));
        assert_eq!(llm.request_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_attempts_return_last_error() {
        let llm = ScriptedLlm::new();
        for _ in 0..3 {
            llm.push_error(LlmError::Status { status: 500, body: "boom".to_string() });
        }
        let client = RetryingClient::new(llm.clone(), fast());

        let error = client.send(request()).await.expect_err("all attempts fail");

        assert!(matches!(error, LlmError::Status { status: 500, .. }));
        assert_eq!(llm.request_count(), 3);
    }

    #[tokio::test]
    async fn empty_message_lists_are_rejected_up_front() {
        let llm = ScriptedLlm::new();
        let client = RetryingClient::new(llm.clone(), fast());

        let error = client
            .send(LlmRequest::new(Vec::new(), "system", 64))
            .await
            .expect_err("empty list");

        assert_eq!(error, LlmError::EmptyMessages);
        assert_eq!(llm.request_count(), 0);
    }
}
