//! In-process stand-in for the language model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, LlmRequest, LlmResponse, Usage};

/// Replays queued replies in order and records every request it receives. Once the
/// queue runs dry every call fails with a transport error.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    replies: Arc<Mutex<VecDeque<Result<LlmResponse, LlmError>>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let llm = Self::new();
        for text in texts {
            llm.push_text(text);
        }
        llm
    }

    pub fn push_text(&self, text: impl Into<String>) {
        let usage = Usage { input_tokens: 10, output_tokens: 20 };
        self.push(Ok(LlmResponse::from_text(text, usage)));
    }

    pub fn push_error(&self, error: LlmError) {
        self.push(Err(error));
    }

    pub fn push(&self, reply: Result<LlmResponse, LlmError>) {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push_back(reply);
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn send(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("no scripted reply left".to_string())))
    }
}
