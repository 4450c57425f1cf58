use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde_json::Value;
use tracing::info;

use triad_agent::{InsightsTurn, IntakeTurn, TechSpecTurn};
use triad_core::domain::conversation::HistoryEntry;
use triad_core::domain::session::SessionKey;

use crate::error::ApiError;
use crate::routes::Success;
use crate::state::AppState;

pub const MESSAGE_REQUIRED: &str = "Message is required and must be a non-empty string";
pub const HISTORY_NOT_ARRAY: &str = "conversationHistory must be an array if provided";

/// Validated agent request body.
#[derive(Debug, PartialEq, Eq)]
pub struct AgentRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

impl AgentRequest {
    /// Parses `{message, conversationHistory?}`. History entries that are not objects are
    /// dropped here; the agent layer filters the remaining ones by role and content.
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .ok_or_else(|| ApiError::validation(MESSAGE_REQUIRED))?;

        let history = match body.get("conversationHistory") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<HistoryEntry>(entry.clone()).ok())
                .collect(),
            Some(_) => return Err(ApiError::validation(HISTORY_NOT_ARRAY)),
        };

        Ok(Self { message: message.to_string(), history })
    }
}

fn parse_body(body: Result<Json<Value>, JsonRejection>) -> Result<AgentRequest, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    AgentRequest::parse(&body)
}

pub async fn intake(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<IntakeTurn>>, ApiError> {
    let request = parse_body(body)?;
    info!(
        event_name = "http.agents.intake",
        session_id = session.short(),
        history_len = request.history.len(),
        "intake request received"
    );
    let turn = state
        .runtime
        .handle_intake(&session, &request.message, &request.history)
        .await
        .map_err(|error| ApiError::agent(error, session.short()))?;
    Ok(Json(Success::new(&session, turn)))
}

pub async fn insights(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<InsightsTurn>>, ApiError> {
    let request = parse_body(body)?;
    info!(
        event_name = "http.agents.insights",
        session_id = session.short(),
        history_len = request.history.len(),
        "insights request received"
    );
    let turn = state
        .runtime
        .handle_insights(&session, &request.message, &request.history)
        .await
        .map_err(|error| ApiError::agent(error, session.short()))?;
    Ok(Json(Success::new(&session, turn)))
}

pub async fn techspec(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<TechSpecTurn>>, ApiError> {
    let request = parse_body(body)?;
    info!(
        event_name = "http.agents.techspec",
        session_id = session.short(),
        history_len = request.history.len(),
        "techspec request received"
    );
    let turn = state
        .runtime
        .handle_techspec(&session, &request.message, &request.history)
        .await
        .map_err(|error| ApiError::agent(error, session.short()))?;
    Ok(Json(Success::new(&session, turn)))
}
