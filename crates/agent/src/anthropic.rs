use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, error};

use triad_core::config::LlmConfig;
use triad_core::domain::conversation::ConversationTurn;

use crate::llm::{LlmClient, LlmError, LlmRequest, LlmResponse};

pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ConversationTurn],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

/// Messages API client. Retries are layered on top with [`crate::retry::RetryingClient`].
pub struct AnthropicClient {
    http: Client,
    api_key: Option<SecretString>,
    endpoint: String,
    model: String,
}

impl AnthropicClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn send(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::EmptyMessages);
        }
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey)?;

        let body = MessagesBody {
            model: &self.model,
            max_tokens: request.max_tokens,
            messages: &request.messages,
            system: request.system.as_deref(),
        };

        debug!(
            event_name = "llm.request.sent",
            model = %self.model,
            max_tokens = request.max_tokens,
            messages = request.messages.len(),
            "sending messages request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    LlmError::Transport(format!("request timed out: {error}"))
                } else {
                    LlmError::Transport(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                event_name = "llm.request.rejected",
                status = status.as_u16(),
                "provider returned an error status"
            );
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let parsed: LlmResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;

        debug!(
            event_name = "llm.request.completed",
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "messages request completed"
        );
        Ok(parsed)
    }
}
