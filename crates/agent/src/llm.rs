use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use triad_core::domain::conversation::ConversationTurn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LlmRequest {
    pub messages: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn new(messages: Vec<ConversationTurn>, system: impl Into<String>, max_tokens: u32) -> Self {
        Self { messages, system: Some(system.into()), max_tokens }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: "text".to_string(), text: Some(text.into()) }
    }
}

/// Token counters as reported by the provider. Serialized in the camelCase shape the
/// HTTP clients expect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(alias = "input_tokens")]
    pub input_tokens: u64,
    #[serde(alias = "output_tokens")]
    pub output_tokens: u64,
}

impl Usage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Usage,
}

impl LlmResponse {
    pub fn from_text(text: impl Into<String>, usage: Usage) -> Self {
        Self { content: vec![ContentBlock::text(text)], usage }
    }

    /// Concatenates every text block in order; non-text blocks are skipped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("message list must not be empty")]
    EmptyMessages,
    #[error("no API key configured")]
    MissingApiKey,
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("could not decode provider response: {0}")]
    Decode(String),
}

impl LlmError {
    /// Server-side and network failures are worth another attempt; anything the
    /// provider rejected as a client error is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Transport(_) => true,
            Self::EmptyMessages | Self::MissingApiKey | Self::Decode(_) => false,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn send(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

#[async_trait]
impl<T> LlmClient for std::sync::Arc<T>
where
    T: LlmClient + ?Sized,
{
    async fn send(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentBlock, LlmError, LlmResponse, Usage};

    #[test]
    fn text_joins_text_blocks_only() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::text("Hello, "),
                ContentBlock { kind: "tool_use".to_string(), text: None },
                ContentBlock::text("world"),
            ],
            usage: Usage::default(),
        };

        assert_eq!(response.text(), "Hello, world");
    }

    #[test]
    fn usage_reads_provider_field_names() {
        let usage: Usage = serde_json::from_str(r#"{"input_tokens": 12, "output_tokens": 30}"#)
            .expect("usage should parse");
        assert_eq!(usage, Usage { input_tokens: 12, output_tokens: 30 });
        assert_eq!(usage.total_tokens(), 42);

        let wire = serde_json::to_value(usage).expect("serialize");
        assert_eq!(wire["inputTokens"], 12);
    }

    #[test]
    fn only_server_and_network_failures_retry() {
        assert!(LlmError::Status { status: 529, body: String::new() }.is_retryable());
        assert!(LlmError::Status { status: 500, body: String::new() }.is_retryable());
        assert!(LlmError::Transport("connection reset".to_string()).is_retryable());
        assert!(!LlmError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!LlmError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!LlmError::EmptyMessages.is_retryable());
    }
}
