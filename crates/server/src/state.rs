use std::sync::Arc;

use triad_agent::AgentRuntime;
use triad_core::config::Environment;
use triad_store::{InsightRepository, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub runtime: AgentRuntime,
    pub insights: Arc<dyn InsightRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub environment: Environment,
}
