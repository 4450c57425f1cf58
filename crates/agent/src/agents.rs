use tracing::debug;

use triad_core::domain::conversation::ConversationTurn;
use triad_core::domain::feature::AnalysisMode;
use triad_core::errors::DomainError;

use crate::llm::{LlmClient, LlmRequest, Usage};
use crate::prompts::{
    insights_prompt, intake_prompt, techspec_prompt, INSIGHTS_MAX_TOKENS, INTAKE_MAX_TOKENS,
    TECHSPEC_MAX_TOKENS,
};
use crate::AgentError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentRole {
    Intake,
    Insights,
    TechSpec,
}

impl AgentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Insights => "insights",
            Self::TechSpec => "techspec",
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Self::Intake => INTAKE_MAX_TOKENS,
            Self::Insights => INSIGHTS_MAX_TOKENS,
            Self::TechSpec => TECHSPEC_MAX_TOKENS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    pub usage: Usage,
}

/// A role-bound system prompt. Holds no state between calls; continuity comes from the
/// history the caller passes in.
#[derive(Clone, Debug)]
pub struct ConversationalAgent {
    role: AgentRole,
    system_prompt: String,
}

impl ConversationalAgent {
    pub fn intake() -> Self {
        Self { role: AgentRole::Intake, system_prompt: intake_prompt() }
    }

    pub fn insights(insights_context: &str) -> Self {
        Self { role: AgentRole::Insights, system_prompt: insights_prompt(insights_context) }
    }

    pub fn techspec(codebase_context: &str, mode: AnalysisMode) -> Self {
        Self { role: AgentRole::TechSpec, system_prompt: techspec_prompt(codebase_context, mode) }
    }

    /// Message list sent for one turn: the prior turns followed by the new user message.
    pub fn messages(history: &[ConversationTurn], message: &str) -> Vec<ConversationTurn> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ConversationTurn::user(message));
        messages
    }

    pub async fn respond(
        &self,
        llm: &dyn LlmClient,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<AgentReply, AgentError> {
        if message.trim().is_empty() {
            return Err(AgentError::InvalidInput(DomainError::EmptyMessage));
        }

        let request = LlmRequest::new(
            Self::messages(history, message),
            self.system_prompt.clone(),
            self.role.max_tokens(),
        );
        let response = llm.send(request).await?;

        debug!(
            event_name = "agent.reply.received",
            agent = self.role.as_str(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "agent reply received"
        );

        Ok(AgentReply { text: response.text(), usage: response.usage })
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentRole, ConversationalAgent};
    use crate::llm::LlmError;
    use crate::testing::ScriptedLlm;
    use crate::AgentError;
    use triad_core::domain::conversation::{ConversationTurn, Role};
    use triad_core::domain::feature::AnalysisMode;

    #[tokio::test]
    async fn history_precedes_the_new_message() {
        let llm = ScriptedLlm::with_texts(["Got it! Which customer is this for?"]);
        let history = vec![
            ConversationTurn::user("Hi"),
            ConversationTurn::assistant("Hello! Who are we talking about?"),
        ];

        let reply = ConversationalAgent::intake()
            .respond(&llm, &history, "They want Excel export")
            .await
            .expect("reply");

        assert_eq!(reply.text, "Got it! Which customer is this for?");
        let sent = llm.requests();
        assert_eq!(sent[0].messages.len(), 3);
        assert_eq!(sent[0].messages[2].role, Role::User);
        assert_eq!(sent[0].messages[2].content, "They want Excel export");
        assert_eq!(sent[0].max_tokens, AgentRole::Intake.max_tokens());
    }

    #[tokio::test]
    async fn blank_messages_never_reach_the_model() {
        let llm = ScriptedLlm::new();
        let error = ConversationalAgent::insights("ctx")
            .respond(&llm, &[], "   ")
            .await
            .expect_err("blank message");

        assert!(matches!(error, AgentError::InvalidInput(_)));
        assert_eq!(llm.request_count(), 0);
    }

    #[tokio::test]
    async fn transport_errors_propagate_unchanged() {
        let llm = ScriptedLlm::new();
        llm.push_error(LlmError::Status { status: 401, body: "bad key".to_string() });

        let error = ConversationalAgent::techspec("ctx", AnalysisMode::Conversational)
            .respond(&llm, &[], "How hard is this?")
            .await
            .expect_err("transport failure");

        assert!(matches!(error, AgentError::Llm(LlmError::Status { status: 401, .. })));
    }

    #[test]
    fn token_budgets_per_role() {
        assert_eq!(AgentRole::Intake.max_tokens(), 1024);
        assert_eq!(AgentRole::Insights.max_tokens(), 2048);
        assert_eq!(AgentRole::TechSpec.max_tokens(), 4096);
    }
}
