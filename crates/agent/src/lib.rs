//! Agent runtime for the CSM, PM and Engineering Lead roles.
//!
//! Each turn follows the same constrained loop:
//! 1. **Context** (`context`) renders session state and catalog data into prompt text.
//! 2. **Reply** (`agents`) runs the role's conversational agent through the LLM transport.
//! 3. **Derive** runs the role's follow-up step: structured extraction for intake
//!    (`extraction`), the hand-off scan for insights (`trigger`).
//!
//! The model never decides completeness, validity or whether a hand-off payload is usable.
//! Those are deterministic checks made here and in `triad-core`.

use thiserror::Error;

use triad_core::errors::{ApplicationError, DomainError};
use triad_store::RepositoryError;

pub mod agents;
pub mod anthropic;
pub mod context;
pub mod extraction;
pub mod llm;
pub mod prompts;
pub mod retry;
pub mod runtime;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trigger;

pub use anthropic::AnthropicClient;
pub use llm::{LlmClient, LlmError, LlmRequest, LlmResponse, Usage};
pub use retry::{RetryConfig, RetryingClient};
pub use runtime::{
    AgentRuntime, AutonomousAnalysis, InsightsTurn, IntakeTurn, TechAnalysisResult, TechSpecTurn,
};
pub use trigger::{scan_for_trigger, TriggerScan, TECH_ANALYSIS_MARKER};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    InvalidInput(DomainError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AgentError> for ApplicationError {
    fn from(error: AgentError) -> Self {
        match error {
            AgentError::InvalidInput(domain) => Self::Domain(domain),
            AgentError::Llm(llm) => Self::Integration(llm.to_string()),
            AgentError::Repository(repository) => Self::Persistence(repository.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentError;
    use crate::llm::LlmError;
    use triad_core::errors::{ApplicationError, DomainError};
    use triad_store::RepositoryError;

    #[test]
    fn agent_errors_map_onto_application_layers() {
        assert_eq!(
            ApplicationError::from(AgentError::InvalidInput(DomainError::EmptyMessage)),
            ApplicationError::Domain(DomainError::EmptyMessage)
        );
        assert!(matches!(
            ApplicationError::from(AgentError::from(LlmError::Transport("reset".to_string()))),
            ApplicationError::Integration(_)
        ));
        assert!(matches!(
            ApplicationError::from(AgentError::from(RepositoryError::MissingSessionKey)),
            ApplicationError::Persistence(_)
        ));
    }
}
