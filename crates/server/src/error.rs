use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use triad_agent::AgentError;
use triad_core::errors::{ApplicationError, InterfaceError};
use triad_store::RepositoryError;

pub const VALIDATION_ERROR: &str = "Validation Error";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, error: VALIDATION_ERROR, message: message.into() }
    }

    /// Maps an application failure through the user-safe interface layer. Only bad
    /// requests carry their detailed message back to the caller.
    pub fn from_application(failure: ApplicationError, correlation_id: &str) -> Self {
        let interface = failure.into_interface(correlation_id);
        match &interface {
            InterfaceError::BadRequest { message, .. } => Self::validation(message.clone()),
            InterfaceError::ServiceUnavailable { message, correlation_id } => {
                warn!(
                    event_name = "http.request.upstream_unavailable",
                    session_id = %correlation_id,
                    error = %message,
                    "language model unavailable"
                );
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    error: "Agent Error",
                    message: interface.user_message().to_string(),
                }
            }
            InterfaceError::Internal { message, correlation_id } => {
                error!(
                    event_name = "http.request.internal_error",
                    session_id = %correlation_id,
                    error = %message,
                    "request failed"
                );
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: "Internal Server Error",
                    message: interface.user_message().to_string(),
                }
            }
        }
    }

    pub fn agent(failure: AgentError, correlation_id: &str) -> Self {
        Self::from_application(ApplicationError::from(failure), correlation_id)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(failure: RepositoryError) -> Self {
        match failure {
            RepositoryError::DuplicateInsight(_) => Self {
                status: StatusCode::CONFLICT,
                error: "Conflict",
                message: failure.to_string(),
            },
            RepositoryError::MissingSessionKey => Self::from_application(
                ApplicationError::Persistence(failure.to_string()),
                "unassigned",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.error.to_string(), message: self.message };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::ApiError;
    use triad_agent::{AgentError, LlmError};
    use triad_core::errors::DomainError;
    use triad_core::domain::insight::InsightId;
    use triad_store::RepositoryError;

    #[test]
    fn empty_message_is_a_validation_error() {
        let error = ApiError::agent(AgentError::InvalidInput(DomainError::EmptyMessage), "abc");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error, "Validation Error");
        assert_eq!(error.message, "message must not be empty");
    }

    #[test]
    fn upstream_failures_hide_provider_details() {
        let error = ApiError::agent(
            AgentError::Llm(LlmError::Status { status: 529, body: "secret detail".to_string() }),
            "abc",
        );
        assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!error.message.contains("secret detail"));
    }

    #[test]
    fn duplicate_insights_conflict() {
        let error = ApiError::from(RepositoryError::DuplicateInsight(InsightId("insight-1".to_string())));
        assert_eq!(error.status, StatusCode::CONFLICT);
    }
}
