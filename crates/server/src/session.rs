use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

use triad_core::domain::session::SessionKey;

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

/// Resolves the caller's session from `X-Session-ID`. A missing or unknown id gets a fresh
/// session. The resolved id is stored in request extensions and echoed in the response.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(SessionKey::new);

    let known = match &presented {
        Some(key) => match state.sessions.exists(key).await {
            Ok(exists) => exists,
            Err(error) => return ApiError::from(error).into_response(),
        },
        None => false,
    };

    let session = match presented {
        Some(key) if known => {
            debug!(event_name = "http.session.resumed", session_id = key.short(), "session resumed");
            key
        }
        _ => {
            let key = SessionKey::generate();
            info!(event_name = "http.session.created", session_id = key.short(), "session created");
            key
        }
    };

    if let Err(error) = state.sessions.touch(&session).await {
        return ApiError::from(error).into_response();
    }

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(session.as_str()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
