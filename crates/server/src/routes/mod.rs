use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use triad_core::domain::session::SessionKey;

use crate::health;
use crate::session::{resolve_session, SESSION_HEADER};
use crate::state::AppState;

pub mod agents;
pub mod insights;

/// Success envelope shared by every session-scoped route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
    pub session_id: String,
}

impl<T> Success<T> {
    pub fn new(session: &SessionKey, body: T) -> Self {
        Self { success: true, body, session_id: session.to_string() }
    }
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let session_routes = Router::new()
        .route("/api/agents/intake", post(agents::intake))
        .route("/api/agents/insights", post(agents::insights))
        .route("/api/agents/techspec", post(agents::techspec))
        .route("/api/insights", get(insights::list))
        .route("/api/insights/submit", post(insights::submit))
        .route("/api/insights/count", get(insights::count))
        .route("/api/insights/stats", get(insights::stats))
        .route("/api/insights/clear", delete(insights::clear))
        .route("/api/insights/reset", post(insights::reset))
        .route("/api/techspecs", get(insights::tech_specs))
        .route_layer(middleware::from_fn_with_state(state.clone(), resolve_session));

    Router::new()
        .route("/api/health", get(health::health))
        .merge(session_routes)
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(event_name = "system.cors.invalid_origin", origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let session_header = HeaderName::from_static(SESSION_HEADER);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, session_header.clone()])
        .expose_headers([session_header])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use triad_agent::testing::ScriptedLlm;
    use triad_agent::AgentRuntime;
    use triad_core::config::Environment;
    use triad_core::domain::request::StructuredRequest;
    use triad_core::domain::session::SessionKey;
    use triad_store::{InMemoryInsightRepository, InMemorySessionStore, SessionStore};

    use super::router;
    use crate::session::SESSION_HEADER;
    use crate::state::AppState;

    fn app(llm: &ScriptedLlm) -> Router {
        app_with_sessions(llm).0
    }

    fn app_with_sessions(llm: &ScriptedLlm) -> (Router, Arc<InMemorySessionStore>) {
        let insights = Arc::new(InMemoryInsightRepository::default());
        let sessions = Arc::new(InMemorySessionStore::default());
        let runtime = AgentRuntime::new(Arc::new(llm.clone()), insights.clone(), sessions.clone());
        let state = AppState {
            runtime,
            insights,
            sessions: sessions.clone(),
            environment: Environment::Development,
        };
        (router(state, &["http://localhost:5173".to_string()]), sessions)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        session: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, session, json)
    }

    fn insight(company: &str, tier: &str) -> Value {
        json!({
            "insight": {
                "customer": {"companyName": company, "tier": tier, "arr": 100000},
                "request": {"title": "Bulk export", "priority": "high", "category": "Reporting"}
            }
        })
    }

    #[tokio::test]
    async fn health_reports_environment_without_a_session() {
        let app = app(&ScriptedLlm::new());
        let (status, session, body) = send(&app, "GET", "/api/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(session, None);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "development");
    }

    #[tokio::test]
    async fn unknown_session_ids_are_replaced_and_known_ones_reused() {
        let app = app(&ScriptedLlm::new());

        let (_, first, body) =
            send(&app, "GET", "/api/insights/count", Some("made-up"), None).await;
        let first = first.expect("session header");
        assert_ne!(first, "made-up");
        assert_eq!(first.len(), 32);
        assert_eq!(body["count"], 0);
        assert_eq!(body["sessionId"], format!("{}...", &first[..8]));

        let (_, second, _) = send(&app, "GET", "/api/insights/count", Some(&first), None).await;
        assert_eq!(second.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn insights_are_partitioned_by_session() {
        let app = app(&ScriptedLlm::new());
        let (_, alice, _) = send(&app, "GET", "/api/insights/count", None, None).await;
        let (_, bob, _) = send(&app, "GET", "/api/insights/count", None, None).await;
        let (alice, bob) = (alice.expect("alice"), bob.expect("bob"));

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/insights/submit",
            Some(&alice),
            Some(insight("Acme Corp", "Enterprise")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Insight submitted successfully");
        assert_eq!(body["insight"]["submittedBy"], "CSM");
        send(&app, "POST", "/api/insights/submit", Some(&alice), Some(insight("CloudVista", "Growth")))
            .await;

        let (_, _, listed) =
            send(&app, "GET", "/api/insights?tier=Enterprise", Some(&alice), None).await;
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["insights"][0]["customer"]["companyName"], "Acme Corp");

        let (_, _, stats) = send(&app, "GET", "/api/insights/stats", Some(&alice), None).await;
        assert_eq!(stats["stats"]["totalInsights"], 2);
        assert_eq!(stats["stats"]["totalARR"], 200000.0);

        let (_, _, other) = send(&app, "GET", "/api/insights/count", Some(&bob), None).await;
        assert_eq!(other["count"], 0);

        let (status, _, cleared) =
            send(&app, "DELETE", "/api/insights/clear", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["message"], "All insights cleared for this session");
        let (_, _, after) = send(&app, "GET", "/api/insights/count", Some(&alice), None).await;
        assert_eq!(after["count"], 0);
    }

    #[tokio::test]
    async fn submissions_need_customer_and_request_sections() {
        let app = app(&ScriptedLlm::new());

        let (status, _, body) = send(&app, "POST", "/api/insights/submit", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Insight data is required");

        let (status, _, body) = send(
            &app,
            "POST",
            "/api/insights/submit",
            None,
            Some(json!({"insight": {"customer": {"companyName": "Acme Corp"}}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation Error");
        assert_eq!(body["message"], "Insight must include customer and request data");
    }

    #[tokio::test]
    async fn submitting_clears_the_intake_draft() {
        let (app, sessions) = app_with_sessions(&ScriptedLlm::new());
        let (_, session, _) = send(&app, "GET", "/api/insights/count", None, None).await;
        let session = session.expect("session");
        let key = SessionKey::new(session.clone());
        let mut draft = StructuredRequest::default();
        draft.customer.company_name = "Acme Corp".to_string();
        sessions.save_draft(&key, draft).await.expect("save draft");

        let (status, _, _) = send(
            &app,
            "POST",
            "/api/insights/submit",
            Some(&session),
            Some(insight("Acme Corp", "Enterprise")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(sessions.draft(&key).await, Ok(None));
    }

    #[tokio::test]
    async fn agent_routes_validate_the_message() {
        let llm = ScriptedLlm::new();
        let app = app(&llm);

        let (status, _, body) =
            send(&app, "POST", "/api/agents/intake", None, Some(json!({"message": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Message is required and must be a non-empty string");
        assert_eq!(llm.request_count(), 0);
    }

    #[tokio::test]
    async fn techspec_turn_round_trips_through_http() {
        let llm = ScriptedLlm::with_texts(["Reuse the Export API."]);
        let app = app(&llm);

        let (status, session, body) = send(
            &app,
            "POST",
            "/api/agents/techspec",
            None,
            Some(json!({
                "message": "How would we build bulk export?",
                "conversationHistory": [{"role": "user", "content": "context"}, {"role": "assistant"}]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(session.is_some());
        assert_eq!(body["success"], true);
        assert_eq!(body["response"], "Reuse the Export API.");
        assert_eq!(body["mode"], "conversational");
        assert_eq!(body["codebaseContext"]["componentsCount"], 8);
        assert_eq!(llm.requests()[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn upstream_failures_surface_as_service_unavailable() {
        let llm = ScriptedLlm::new();
        llm.push_error(triad_agent::LlmError::Status { status: 401, body: "bad key".to_string() });
        let app = app(&llm);

        let (status, _, body) =
            send(&app, "POST", "/api/agents/insights", None, Some(json!({"message": "patterns?"})))
                .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Agent Error");
        assert!(!body["message"].as_str().unwrap_or_default().contains("bad key"));
    }

    #[tokio::test]
    async fn reset_forgets_insights_and_tech_specs() {
        let llm = ScriptedLlm::with_texts(["Spec body"]);
        let app = app(&llm);
        let (_, session, _) = send(
            &app,
            "POST",
            "/api/insights/submit",
            None,
            Some(insight("Acme Corp", "Enterprise")),
        )
        .await;
        let session = session.expect("session");

        let (status, _, body) = send(&app, "POST", "/api/insights/reset", Some(&session), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "All session data has been reset");

        let (_, _, count) = send(&app, "GET", "/api/insights/count", Some(&session), None).await;
        assert_eq!(count["count"], 0);
        let (_, _, specs) = send(&app, "GET", "/api/techspecs", Some(&session), None).await;
        assert_eq!(specs["count"], 0);
    }
}
