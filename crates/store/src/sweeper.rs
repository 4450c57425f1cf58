use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::repositories::{InsightRepository, SessionStore};

/// Reclaims idle sessions from both stores on a fixed interval.
///
/// The first tick fires one full interval after spawning. Abort the returned handle
/// to stop sweeping.
pub fn spawn_sweeper(
    insights: Arc<dyn InsightRepository>,
    sessions: Arc<dyn SessionStore>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + every;
        let mut interval = tokio::time::interval_at(start, every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            sweep_once(insights.as_ref(), sessions.as_ref()).await;
        }
    })
}

/// One sweep pass over both stores; returns `(insight sessions, working sessions)` removed.
pub async fn sweep_once(
    insights: &dyn InsightRepository,
    sessions: &dyn SessionStore,
) -> (usize, usize) {
    let now = Utc::now();
    let removed_insights = match insights.sweep_expired(now).await {
        Ok(removed) => removed,
        Err(error) => {
            tracing::warn!(event_name = "store.sweep.failed", store = "insights", error = %error, "session sweep failed");
            0
        }
    };
    let removed_sessions = match sessions.sweep_expired(now).await {
        Ok(removed) => removed,
        Err(error) => {
            tracing::warn!(event_name = "store.sweep.failed", store = "sessions", error = %error, "session sweep failed");
            0
        }
    };

    if removed_insights > 0 || removed_sessions > 0 {
        tracing::info!(
            event_name = "store.sweep.completed",
            removed_insight_sessions = removed_insights,
            removed_working_sessions = removed_sessions,
            "expired sessions reclaimed"
        );
    }

    (removed_insights, removed_sessions)
}
