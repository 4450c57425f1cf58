use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use triad_core::domain::feature::TechSpec;
use triad_core::domain::insight::{
    Insight, InsightFilters, InsightId, InsightStats, InsightSubmission,
};
use triad_core::domain::request::StructuredRequest;
use triad_core::domain::session::SessionKey;

pub mod memory;

pub use memory::{InMemoryInsightRepository, InMemorySessionStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("session id is required")]
    MissingSessionKey,
    #[error("insight `{0}` already exists in this session")]
    DuplicateInsight(InsightId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Truncated session id.
    pub session_id: String,
    pub insights_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub age_secs: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub total_sessions: usize,
    pub sessions: Vec<SessionSummary>,
}

/// Insights submitted by CSMs, partitioned by session.
#[async_trait]
pub trait InsightRepository: Send + Sync {
    async fn submit(
        &self,
        session: &SessionKey,
        submission: InsightSubmission,
    ) -> Result<Insight, RepositoryError>;

    async fn list(
        &self,
        session: &SessionKey,
        filters: &InsightFilters,
    ) -> Result<Vec<Insight>, RepositoryError>;

    /// Does not create or refresh the session.
    async fn count(&self, session: &SessionKey) -> Result<usize, RepositoryError>;

    async fn stats(&self, session: &SessionKey) -> Result<InsightStats, RepositoryError>;

    /// Returns how many insights were removed.
    async fn clear(&self, session: &SessionKey) -> Result<usize, RepositoryError>;

    /// Drops sessions idle for longer than the TTL; returns how many were dropped.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;

    async fn service_stats(&self, now: DateTime<Utc>) -> Result<ServiceStats, RepositoryError>;
}

/// Per-session working state outside the insight repository: the CSM's current
/// intake draft and the tech specs produced for the session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether the session is live. Does not create or refresh it.
    async fn exists(&self, session: &SessionKey) -> Result<bool, RepositoryError>;

    /// Creates the session on first use and marks it as accessed.
    async fn touch(&self, session: &SessionKey) -> Result<(), RepositoryError>;

    async fn draft(&self, session: &SessionKey)
        -> Result<Option<StructuredRequest>, RepositoryError>;

    async fn save_draft(
        &self,
        session: &SessionKey,
        draft: StructuredRequest,
    ) -> Result<(), RepositoryError>;

    /// Drops the intake draft once it has been submitted. Tech specs are kept.
    async fn clear_draft(&self, session: &SessionKey) -> Result<(), RepositoryError>;

    /// Returns the number of specs held after the push.
    async fn push_tech_spec(
        &self,
        session: &SessionKey,
        spec: TechSpec,
    ) -> Result<usize, RepositoryError>;

    async fn tech_specs(&self, session: &SessionKey) -> Result<Vec<TechSpec>, RepositoryError>;

    /// Forgets the draft and tech specs but keeps the session alive.
    async fn reset(&self, session: &SessionKey) -> Result<(), RepositoryError>;

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;
}
