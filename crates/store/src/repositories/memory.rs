use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use triad_core::domain::feature::TechSpec;
use triad_core::domain::insight::{Insight, InsightFilters, InsightStats, InsightSubmission};
use triad_core::domain::request::StructuredRequest;
use triad_core::domain::session::SessionKey;

use super::{
    InsightRepository, RepositoryError, ServiceStats, SessionStore, SessionSummary,
};

pub const DEFAULT_TTL_SECS: u64 = 2 * 60 * 60;

fn require_key(session: &SessionKey) -> Result<(), RepositoryError> {
    if session.is_blank() {
        return Err(RepositoryError::MissingSessionKey);
    }
    Ok(())
}

fn is_expired(last_accessed_at: DateTime<Utc>, now: DateTime<Utc>, ttl_secs: u64) -> bool {
    let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
    (now - last_accessed_at).num_seconds() > ttl
}

struct InsightSession {
    insights: Vec<Insight>,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
}

impl InsightSession {
    fn new(now: DateTime<Utc>) -> Self {
        Self { insights: Vec::new(), created_at: now, last_accessed_at: now }
    }
}

pub struct InMemoryInsightRepository {
    sessions: RwLock<HashMap<SessionKey, InsightSession>>,
    ttl_secs: u64,
}

impl Default for InMemoryInsightRepository {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_TTL_SECS)
    }
}

impl InMemoryInsightRepository {
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), ttl_secs }
    }

    /// Runs `f` against the session's entry, creating it on first use and marking it
    /// as accessed.
    async fn with_session<T>(
        &self,
        session: &SessionKey,
        f: impl FnOnce(&mut InsightSession) -> T,
    ) -> Result<T, RepositoryError> {
        require_key(session)?;
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(session.clone()).or_insert_with(|| InsightSession::new(now));
        entry.last_accessed_at = now;
        Ok(f(entry))
    }
}

#[async_trait::async_trait]
impl InsightRepository for InMemoryInsightRepository {
    async fn submit(
        &self,
        session: &SessionKey,
        submission: InsightSubmission,
    ) -> Result<Insight, RepositoryError> {
        let insight = submission.into_insight(Utc::now());
        let stored = self
            .with_session(session, |entry| {
                if entry.insights.iter().any(|existing| existing.insight_id == insight.insight_id)
                {
                    return Err(RepositoryError::DuplicateInsight(insight.insight_id.clone()));
                }
                entry.insights.push(insight.clone());
                Ok(entry.insights.len())
            })
            .await??;

        tracing::info!(
            event_name = "store.insight.submitted",
            session_id = session.short(),
            insight_id = %insight.insight_id,
            company = insight.record.customer.company_name.as_str(),
            session_insights = stored,
            "insight submitted"
        );
        Ok(insight)
    }

    async fn list(
        &self,
        session: &SessionKey,
        filters: &InsightFilters,
    ) -> Result<Vec<Insight>, RepositoryError> {
        self.with_session(session, |entry| {
            entry.insights.iter().filter(|insight| filters.matches(insight)).cloned().collect()
        })
        .await
    }

    async fn count(&self, session: &SessionKey) -> Result<usize, RepositoryError> {
        if session.is_blank() {
            return Ok(0);
        }
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session).map(|entry| entry.insights.len()).unwrap_or(0))
    }

    async fn stats(&self, session: &SessionKey) -> Result<InsightStats, RepositoryError> {
        self.with_session(session, |entry| InsightStats::from_insights(&entry.insights)).await
    }

    async fn clear(&self, session: &SessionKey) -> Result<usize, RepositoryError> {
        let removed = self
            .with_session(session, |entry| {
                let removed = entry.insights.len();
                entry.insights.clear();
                removed
            })
            .await?;

        tracing::info!(
            event_name = "store.insight.cleared",
            session_id = session.short(),
            removed,
            "cleared session insights"
        );
        Ok(removed)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !is_expired(entry.last_accessed_at, now, self.ttl_secs));
        Ok(before - sessions.len())
    }

    async fn service_stats(&self, now: DateTime<Utc>) -> Result<ServiceStats, RepositoryError> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(key, entry)| SessionSummary {
                session_id: format!("{}...", key.short()),
                insights_count: entry.insights.len(),
                created_at: entry.created_at,
                last_accessed_at: entry.last_accessed_at,
                age_secs: (now - entry.last_accessed_at).num_seconds(),
            })
            .collect();
        summaries.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        Ok(ServiceStats { total_sessions: summaries.len(), sessions: summaries })
    }
}

#[derive(Default)]
struct WorkingSession {
    draft: Option<StructuredRequest>,
    tech_specs: Vec<TechSpec>,
    last_accessed_at: Option<DateTime<Utc>>,
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, WorkingSession>>,
    ttl_secs: u64,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_ttl_secs(DEFAULT_TTL_SECS)
    }
}

impl InMemorySessionStore {
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), ttl_secs }
    }

    async fn with_session<T>(
        &self,
        session: &SessionKey,
        f: impl FnOnce(&mut WorkingSession) -> T,
    ) -> Result<T, RepositoryError> {
        require_key(session)?;
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(session.clone()).or_default();
        entry.last_accessed_at = Some(Utc::now());
        Ok(f(entry))
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn exists(&self, session: &SessionKey) -> Result<bool, RepositoryError> {
        require_key(session)?;
        Ok(self.sessions.read().await.contains_key(session))
    }

    async fn touch(&self, session: &SessionKey) -> Result<(), RepositoryError> {
        self.with_session(session, |_| ()).await
    }

    async fn draft(
        &self,
        session: &SessionKey,
    ) -> Result<Option<StructuredRequest>, RepositoryError> {
        self.with_session(session, |entry| entry.draft.clone()).await
    }

    async fn save_draft(
        &self,
        session: &SessionKey,
        draft: StructuredRequest,
    ) -> Result<(), RepositoryError> {
        self.with_session(session, |entry| entry.draft = Some(draft)).await
    }

    async fn clear_draft(&self, session: &SessionKey) -> Result<(), RepositoryError> {
        self.with_session(session, |entry| entry.draft = None).await
    }

    async fn push_tech_spec(
        &self,
        session: &SessionKey,
        spec: TechSpec,
    ) -> Result<usize, RepositoryError> {
        self.with_session(session, |entry| {
            entry.tech_specs.push(spec);
            entry.tech_specs.len()
        })
        .await
    }

    async fn tech_specs(&self, session: &SessionKey) -> Result<Vec<TechSpec>, RepositoryError> {
        self.with_session(session, |entry| entry.tech_specs.clone()).await
    }

    async fn reset(&self, session: &SessionKey) -> Result<(), RepositoryError> {
        self.with_session(session, |entry| {
            entry.draft = None;
            entry.tech_specs.clear();
        })
        .await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.last_accessed_at {
            Some(last) => !is_expired(last, now, self.ttl_secs),
            None => false,
        });
        Ok(before - sessions.len())
    }
}
