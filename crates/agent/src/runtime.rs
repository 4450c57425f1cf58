use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use triad_core::catalog::codebase::{COMPONENTS, PAST_IMPLEMENTATIONS};
use triad_core::domain::conversation::{filter_history, ConversationTurn, HistoryEntry};
use triad_core::domain::feature::{
    AnalysisMode, FeatureRequirements, FeatureRequirementsInput, TechSpec,
};
use triad_core::domain::insight::{InsightFilters, InsightStats};
use triad_core::domain::request::{CustomerDetails, StructuredRequest, ValidationReport};
use triad_core::domain::session::SessionKey;
use triad_core::errors::DomainError;
use triad_store::{InsightRepository, SessionStore};

use crate::agents::ConversationalAgent;
use crate::context::{autonomous_request_prompt, format_codebase_context, format_insights_context};
use crate::extraction::{extract_structured_request, ExtractionSeed};
use crate::llm::{LlmClient, Usage};
use crate::trigger::{degraded_display_text, scan_for_trigger, TriggerScan};
use crate::AgentError;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFound {
    pub customer: Option<CustomerDetails>,
    pub similar_requests: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeTurn {
    pub response: String,
    pub usage: Usage,
    pub structured_request: StructuredRequest,
    pub request_summary: String,
    pub validation: ValidationReport,
    pub context_found: ContextFound,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsSnapshot {
    pub total_insights: usize,
    pub stats: InsightStats,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechAnalysisResult {
    pub timestamp: DateTime<Utc>,
    pub feature_title: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsTurn {
    pub response: String,
    pub usage: Usage,
    pub insights_context: InsightsSnapshot,
    pub tech_analysis_triggered: bool,
    pub tech_analysis_result: Option<TechAnalysisResult>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebaseSummary {
    pub components_count: usize,
    pub past_implementations_count: usize,
}

impl CodebaseSummary {
    fn current() -> Self {
        Self { components_count: COMPONENTS.len(), past_implementations_count: PAST_IMPLEMENTATIONS.len() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechSpecTurn {
    pub response: String,
    pub usage: Usage,
    pub mode: AnalysisMode,
    pub codebase_context: CodebaseSummary,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutonomousAnalysis {
    pub text: String,
    pub usage: Usage,
    pub timestamp: DateTime<Utc>,
    pub requirements: FeatureRequirements,
    pub mode: AnalysisMode,
    pub codebase_context: CodebaseSummary,
}

/// Runs agent turns against the shared session stores.
///
/// Within a turn the primary reply is always produced first. Only that call may fail the
/// turn; extraction, hand-off and bookkeeping failures degrade the response instead.
#[derive(Clone)]
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    insights: Arc<dyn InsightRepository>,
    sessions: Arc<dyn SessionStore>,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        insights: Arc<dyn InsightRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self { llm, insights, sessions }
    }

    pub async fn handle_intake(
        &self,
        session: &SessionKey,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<IntakeTurn, AgentError> {
        ensure_message(message)?;
        let history = filter_history(history);

        let reply = ConversationalAgent::intake().respond(self.llm.as_ref(), &history, message).await?;

        let mut transcript = ConversationalAgent::messages(&history, message);
        transcript.push(ConversationTurn::assistant(reply.text.clone()));

        let seed = ExtractionSeed::from_transcript(&transcript);
        let now = Utc::now();
        // No prior turns means a new conversation, so an earlier draft must not leak in.
        let stored = if history.is_empty() {
            Ok(None)
        } else {
            self.sessions.draft(session).await
        };
        let base = match stored {
            Ok(draft) => draft.unwrap_or_else(|| StructuredRequest::template(now)),
            Err(error) => {
                warn!(
                    event_name = "agent.intake.draft_unavailable",
                    session_id = session.short(),
                    error = %error,
                    "could not load previous draft; starting from a fresh template"
                );
                StructuredRequest::template(now)
            }
        };

        let extraction =
            extract_structured_request(self.llm.as_ref(), session, &transcript, base, &seed, now).await;
        let record = extraction.record;

        if let Err(error) = self.sessions.save_draft(session, record.clone()).await {
            warn!(
                event_name = "agent.intake.draft_not_saved",
                session_id = session.short(),
                error = %error,
                "could not store intake draft"
            );
        }

        let validation = record.validate();
        info!(
            event_name = "agent.intake.completed",
            session_id = session.short(),
            completeness = record.meta.completeness,
            is_valid = validation.is_valid,
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "intake turn completed"
        );

        Ok(IntakeTurn {
            response: reply.text,
            usage: reply.usage,
            request_summary: record.summary(),
            structured_request: record,
            validation,
            context_found: ContextFound {
                customer: seed.customer,
                similar_requests: seed.similar_requests,
            },
        })
    }

    pub async fn handle_insights(
        &self,
        session: &SessionKey,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<InsightsTurn, AgentError> {
        ensure_message(message)?;
        let history = filter_history(history);

        let insights = self.insights.list(session, &InsightFilters::default()).await?;
        let stats = InsightStats::from_insights(&insights);
        let context = format_insights_context(&insights, &stats);

        let reply = ConversationalAgent::insights(&context)
            .respond(self.llm.as_ref(), &history, message)
            .await?;

        let mut response = reply.text.clone();
        let mut tech_analysis_result = None;

        match scan_for_trigger(&reply.text) {
            TriggerScan::NoTrigger => {}
            TriggerScan::Malformed { display_text, reason } => {
                warn!(
                    event_name = "agent.insights.trigger_malformed",
                    session_id = session.short(),
                    reason = %reason,
                    "hand-off marker found without a usable payload"
                );
                response = display_text;
            }
            TriggerScan::Triggered { payload, display_text } => {
                info!(
                    event_name = "agent.insights.trigger_detected",
                    session_id = session.short(),
                    feature_title = payload.feature_title(),
                    "starting autonomous technical analysis"
                );
                let feature_title = payload.feature_title().to_string();
                match self.analyse(session, payload).await {
                    Ok(analysis) => {
                        response = display_text;
                        tech_analysis_result =
                            Some(TechAnalysisResult { timestamp: analysis.timestamp, feature_title });
                    }
                    Err(error) => {
                        warn!(
                            event_name = "agent.insights.dispatch_failed",
                            session_id = session.short(),
                            error = %error,
                            "autonomous technical analysis failed"
                        );
                        response = degraded_display_text(&reply.text);
                    }
                }
            }
        }

        info!(
            event_name = "agent.insights.completed",
            session_id = session.short(),
            total_insights = insights.len(),
            tech_analysis_triggered = tech_analysis_result.is_some(),
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "insights turn completed"
        );

        Ok(InsightsTurn {
            response,
            usage: reply.usage,
            insights_context: InsightsSnapshot { total_insights: insights.len(), stats },
            tech_analysis_triggered: tech_analysis_result.is_some(),
            tech_analysis_result,
        })
    }

    pub async fn handle_techspec(
        &self,
        session: &SessionKey,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<TechSpecTurn, AgentError> {
        ensure_message(message)?;
        let history = filter_history(history);
        let mode = AnalysisMode::Conversational;

        let reply = ConversationalAgent::techspec(&format_codebase_context(), mode)
            .respond(self.llm.as_ref(), &history, message)
            .await?;

        info!(
            event_name = "agent.techspec.completed",
            session_id = session.short(),
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            "tech spec turn completed"
        );

        Ok(TechSpecTurn {
            response: reply.text,
            usage: reply.usage,
            mode,
            codebase_context: CodebaseSummary::current(),
        })
    }

    /// Autonomous entry point of the tech spec agent. Accepts either payload shape; the
    /// resulting specification is kept with the session.
    pub async fn perform_autonomous_analysis(
        &self,
        session: &SessionKey,
        requirements: FeatureRequirementsInput,
    ) -> Result<AutonomousAnalysis, AgentError> {
        self.analyse(session, FeatureRequirements::from(requirements)).await
    }

    pub async fn list_tech_specs(&self, session: &SessionKey) -> Result<Vec<TechSpec>, AgentError> {
        Ok(self.sessions.tech_specs(session).await?)
    }

    async fn analyse(
        &self,
        session: &SessionKey,
        requirements: FeatureRequirements,
    ) -> Result<AutonomousAnalysis, AgentError> {
        let mode = AnalysisMode::Autonomous;
        let prompt = autonomous_request_prompt(&requirements);

        let reply = ConversationalAgent::techspec(&format_codebase_context(), mode)
            .respond(self.llm.as_ref(), &[], &prompt)
            .await?;
        let timestamp = Utc::now();

        let spec = TechSpec {
            feature_title: requirements.feature_title().to_string(),
            requirements: requirements.clone(),
            content: reply.text.clone(),
            mode,
            created_at: timestamp,
        };
        match self.sessions.push_tech_spec(session, spec).await {
            Ok(total) => info!(
                event_name = "agent.techspec.analysis_stored",
                session_id = session.short(),
                feature_title = requirements.feature_title(),
                total_specs = total,
                "autonomous analysis completed"
            ),
            Err(error) => warn!(
                event_name = "agent.techspec.analysis_not_stored",
                session_id = session.short(),
                error = %error,
                "could not keep autonomous analysis with the session"
            ),
        }

        Ok(AutonomousAnalysis {
            text: reply.text,
            usage: reply.usage,
            timestamp,
            requirements,
            mode,
            codebase_context: CodebaseSummary::current(),
        })
    }
}

fn ensure_message(message: &str) -> Result<(), AgentError> {
    if message.trim().is_empty() {
        return Err(AgentError::InvalidInput(DomainError::EmptyMessage));
    }
    Ok(())
}
