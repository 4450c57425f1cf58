use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use triad_core::domain::feature::TechSpec;
use triad_core::domain::insight::{
    require_sections, Insight, InsightFilters, InsightStats, InsightSubmission,
};
use triad_core::domain::request::{CustomerTier, Priority};
use triad_core::domain::session::SessionKey;

use crate::error::ApiError;
use crate::routes::Success;
use crate::state::AppState;

pub const INSIGHT_REQUIRED: &str = "Insight data is required";
pub const INSIGHT_SECTIONS_REQUIRED: &str = "Insight must include customer and request data";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InsightQuery {
    pub tier: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "minCompleteness")]
    pub min_completeness: Option<String>,
}

impl InsightQuery {
    /// Blank parameters are ignored; unrecognised tier or priority labels are rejected.
    pub fn into_filters(self) -> Result<InsightFilters, ApiError> {
        fn present(value: Option<String>) -> Option<String> {
            value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
        }

        let tier = present(self.tier)
            .map(|tier| tier.parse::<CustomerTier>().map_err(ApiError::validation))
            .transpose()?;
        let priority = present(self.priority)
            .map(|priority| priority.parse::<Priority>().map_err(ApiError::validation))
            .transpose()?;
        let min_completeness = present(self.min_completeness)
            .map(|value| match value.parse::<u8>() {
                Ok(percent) if percent <= 100 => Ok(percent),
                _ => Err(ApiError::validation(format!(
                    "minCompleteness must be 0-100, got `{value}`"
                ))),
            })
            .transpose()?;

        Ok(InsightFilters { tier, priority, category: present(self.category), min_completeness })
    }
}

#[derive(Debug, Serialize)]
pub struct Submitted {
    pub insight: Insight,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InsightList {
    pub insights: Vec<Insight>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct Count {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub stats: InsightStats,
}

#[derive(Debug, Serialize)]
pub struct Notice {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechSpecList {
    pub tech_specs: Vec<TechSpec>,
    pub count: usize,
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<Submitted>>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let raw = body
        .get("insight")
        .filter(|insight| insight.is_object())
        .ok_or_else(|| ApiError::validation(INSIGHT_REQUIRED))?;
    require_sections(raw).map_err(|_| ApiError::validation(INSIGHT_SECTIONS_REQUIRED))?;

    let submission = serde_json::from_value::<InsightSubmission>(raw.clone())
        .map_err(|error| ApiError::validation(error.to_string()))?;
    let insight = state.insights.submit(&session, submission).await?;

    // A submitted record is final; the next intake starts from a clean template.
    if let Err(error) = state.sessions.clear_draft(&session).await {
        warn!(
            event_name = "http.insights.draft_not_cleared",
            session_id = session.short(),
            error = %error,
            "insight stored but the intake draft could not be cleared"
        );
    }

    info!(
        event_name = "http.insights.submitted",
        session_id = session.short(),
        insight_id = %insight.insight_id,
        completeness = insight.record.meta.completeness,
        "insight submitted"
    );
    Ok(Json(Success::new(
        &session,
        Submitted { insight, message: "Insight submitted successfully" },
    )))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
    Query(query): Query<InsightQuery>,
) -> Result<Json<Success<InsightList>>, ApiError> {
    let filters = query.into_filters()?;
    let insights = state.insights.list(&session, &filters).await?;
    let count = insights.len();
    Ok(Json(Success::new(&session, InsightList { insights, count })))
}

pub async fn count(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<Success<Count>>, ApiError> {
    let count = state.insights.count(&session).await?;
    Ok(Json(Success::new(&session, Count { count })))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<Success<Stats>>, ApiError> {
    let stats = state.insights.stats(&session).await?;
    Ok(Json(Success::new(&session, Stats { stats })))
}

pub async fn clear(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<Success<Notice>>, ApiError> {
    let removed = state.insights.clear(&session).await?;
    info!(event_name = "http.insights.cleared", session_id = session.short(), removed, "insights cleared");
    Ok(Json(Success::new(&session, Notice { message: "All insights cleared for this session" })))
}

pub async fn reset(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<Success<Notice>>, ApiError> {
    state.insights.clear(&session).await?;
    state.sessions.reset(&session).await?;
    info!(event_name = "http.session.reset", session_id = session.short(), "session data reset");
    Ok(Json(Success::new(&session, Notice { message: "All session data has been reset" })))
}

pub async fn tech_specs(
    State(state): State<AppState>,
    Extension(session): Extension<SessionKey>,
) -> Result<Json<Success<TechSpecList>>, ApiError> {
    let tech_specs = state
        .runtime
        .list_tech_specs(&session)
        .await
        .map_err(|error| ApiError::agent(error, session.short()))?;
    let count = tech_specs.len();
    Ok(Json(Success::new(&session, TechSpecList { tech_specs, count })))
}
