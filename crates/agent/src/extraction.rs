//! Secondary model pass that turns an intake transcript into a [`StructuredRequest`].
//!
//! The pass is best effort. Whatever goes wrong (transport, fences, invalid JSON, a section
//! that will not coerce) the caller still gets the seeded record back with completeness
//! recomputed, and the CSM-facing reply is never held up.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use triad_core::catalog::{customer_mentioned_in, similar_requests};
use triad_core::domain::conversation::{ConversationTurn, Role};
use triad_core::domain::request::{CustomerDetails, StructuredRequest};
use triad_core::domain::session::SessionKey;

use crate::llm::{LlmClient, LlmRequest, Usage};
use crate::prompts::{extraction_prompt, EXTRACTION_MAX_TOKENS};

const MAX_SEED_SIMILAR_REQUESTS: usize = 3;

/// Catalog matches found in what the CSM typed, used to pre-fill the draft.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractionSeed {
    pub customer: Option<CustomerDetails>,
    pub similar_requests: Vec<String>,
}

impl ExtractionSeed {
    /// Looks only at user-authored turns so the assistant's own suggestions never seed a
    /// customer match.
    pub fn from_transcript(transcript: &[ConversationTurn]) -> Self {
        let user_text: String = transcript
            .iter()
            .filter(|turn| turn.role == Role::User)
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            customer: customer_mentioned_in(&user_text).map(|record| record.to_details()),
            similar_requests: similar_requests(&user_text)
                .into_iter()
                .take(MAX_SEED_SIMILAR_REQUESTS)
                .map(|request| request.id.to_string())
                .collect(),
        }
    }

    /// Pre-fills the customer section when the seed names a company other than the one
    /// already on `base`. The same company keeps whatever the CSM has refined since.
    pub fn apply_customer(&self, base: &mut StructuredRequest) {
        let Some(customer) = &self.customer else {
            return;
        };
        let current = base.customer.company_name.trim();
        if !current.eq_ignore_ascii_case(customer.company_name.trim()) {
            base.customer = customer.clone();
        }
    }

    /// Unions the seeded ids into `additional.similarRequests`, ahead of anything else.
    pub fn apply_similar_requests(&self, base: &mut StructuredRequest) {
        let similar = &mut base.additional.similar_requests;
        let extra: Vec<String> =
            similar.drain(..).filter(|id| !self.similar_requests.contains(id)).collect();
        similar.extend(self.similar_requests.iter().cloned());
        similar.extend(extra);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub record: StructuredRequest,
    pub usage: Option<Usage>,
    /// Why the model output was not used, when it was not.
    pub fallback_reason: Option<String>,
}

impl Extraction {
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Runs the extraction pass over `transcript`, merging the result onto `base`. The seed
/// customer goes on before the merge and the seed similar requests after it.
pub async fn extract_structured_request(
    llm: &dyn LlmClient,
    session: &SessionKey,
    transcript: &[ConversationTurn],
    base: StructuredRequest,
    seed: &ExtractionSeed,
    now: DateTime<Utc>,
) -> Extraction {
    let mut record = base;
    seed.apply_customer(&mut record);

    let request = LlmRequest::new(
        vec![ConversationTurn::user(render_transcript(transcript))],
        extraction_prompt(),
        EXTRACTION_MAX_TOKENS,
    );

    let (usage, fallback_reason) = match llm.send(request).await {
        Ok(response) => {
            let usage = Some(response.usage);
            match parse_extraction(&response.text()) {
                Ok(extracted) => (usage, merge_extracted(&mut record, &extracted)),
                Err(reason) => (usage, Some(reason)),
            }
        }
        Err(error) => (None, Some(error.to_string())),
    };

    // The extraction pass answers every key, so catalog ids go on after it.
    seed.apply_similar_requests(&mut record);
    record.meta.request_date = Some(now);
    let completeness = record.refresh_completeness();

    match &fallback_reason {
        Some(reason) => warn!(
            event_name = "agent.extraction.fallback",
            session_id = session.short(),
            completeness,
            reason = %reason,
            "structured extraction failed; keeping seeded draft"
        ),
        None => debug!(
            event_name = "agent.extraction.completed",
            session_id = session.short(),
            completeness,
            input_tokens = usage.map(|usage| usage.input_tokens).unwrap_or_default(),
            "structured extraction merged"
        ),
    }

    Extraction { record, usage, fallback_reason }
}

fn render_transcript(transcript: &[ConversationTurn]) -> String {
    let mut out = String::from("Conversation transcript:\n\n");
    for turn in transcript {
        let speaker = match turn.role {
            Role::User => "CSM",
            Role::Assistant => "Intake Agent",
        };
        out.push_str(speaker);
        out.push_str(": ");
        out.push_str(turn.content.trim());
        out.push_str("\n\n");
    }
    out.push_str("Return the JSON object now.");
    out
}

/// Removes a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_extraction(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(strip_code_fences(text)) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(error) => Err(format!("invalid extraction JSON: {error}")),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Overlays the `request`, `impact` and `additional` sections key by key. A key that is
/// present replaces the current value even when it is empty, so a sparser pass can lower
/// completeness. Keys that are absent keep their current value. A section that cannot be
/// coerced is skipped; its reason is returned.
pub fn merge_extracted(record: &mut StructuredRequest, extracted: &Map<String, Value>) -> Option<String> {
    let mut failures = Vec::new();

    match overlay_section(&record.request, extracted.get("request")) {
        Ok(section) => record.request = section,
        Err(error) => failures.push(format!("request: {error}")),
    }
    match overlay_section(&record.impact, extracted.get("impact")) {
        Ok(section) => record.impact = section,
        Err(error) => failures.push(format!("impact: {error}")),
    }
    match overlay_section(&record.additional, extracted.get("additional")) {
        Ok(section) => record.additional = section,
        Err(error) => failures.push(format!("additional: {error}")),
    }

    (!failures.is_empty()).then(|| failures.join("; "))
}

fn overlay_section<T>(current: &T, patch: Option<&Value>) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let Some(Value::Object(patch)) = patch else {
        return Ok(current.clone());
    };

    let mut merged = match serde_json::to_value(current)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    serde_json::from_value(Value::Object(merged))
}
