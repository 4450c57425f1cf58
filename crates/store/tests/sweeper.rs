use std::sync::Arc;
use std::time::Duration;

use triad_core::domain::insight::InsightSubmission;
use triad_core::domain::request::StructuredRequest;
use triad_core::domain::session::SessionKey;
use triad_store::{
    spawn_sweeper, sweep_once, InMemoryInsightRepository, InMemorySessionStore,
    InsightRepository, SessionStore,
};

#[tokio::test]
async fn sweep_once_leaves_fresh_sessions_alone() {
    let insights = InMemoryInsightRepository::with_ttl_secs(3600);
    let sessions = InMemorySessionStore::with_ttl_secs(3600);
    let key = SessionKey::new("fresh-session");

    insights
        .submit(&key, InsightSubmission::from_record(StructuredRequest::default()))
        .await
        .expect("submit");
    sessions.save_draft(&key, StructuredRequest::default()).await.expect("save draft");

    assert_eq!(sweep_once(&insights, &sessions).await, (0, 0));
    assert_eq!(insights.count(&key).await, Ok(1));
}

#[tokio::test]
async fn zero_ttl_sessions_are_reclaimed_by_the_background_task() {
    let insights = Arc::new(InMemoryInsightRepository::with_ttl_secs(0));
    let sessions = Arc::new(InMemorySessionStore::with_ttl_secs(0));
    let key = SessionKey::new("short-lived");

    insights
        .submit(&key, InsightSubmission::from_record(StructuredRequest::default()))
        .await
        .expect("submit");

    // A zero TTL expires an entry once a full second has elapsed.
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let handle = spawn_sweeper(insights.clone(), sessions.clone(), Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();

    assert_eq!(insights.count(&key).await, Ok(0));
    let stats = insights.service_stats(chrono::Utc::now()).await.expect("service stats");
    assert_eq!(stats.total_sessions, 0);
}
