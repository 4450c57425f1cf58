use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use triad_agent::{AgentRuntime, AnthropicClient, LlmError, RetryConfig, RetryingClient};
use triad_core::config::{AppConfig, ConfigError, LoadOptions};
use triad_store::{InMemoryInsightRepository, InMemorySessionStore};

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("language model client could not be built: {0}")]
    Llm(#[source] LlmError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let client = AnthropicClient::from_config(&config.llm).map_err(BootstrapError::Llm)?;
    let retry = RetryConfig::from(&config.llm);
    info!(
        event_name = "system.bootstrap.llm_ready",
        model = client.model(),
        max_attempts = retry.max_attempts,
        "language model client configured"
    );
    let llm = Arc::new(RetryingClient::new(client, retry));

    let insights = Arc::new(InMemoryInsightRepository::with_ttl_secs(config.session.ttl_secs));
    let sessions = Arc::new(InMemorySessionStore::with_ttl_secs(config.session.ttl_secs));
    info!(
        event_name = "system.bootstrap.stores_ready",
        ttl_secs = config.session.ttl_secs,
        "session stores initialised"
    );

    let state = AppState {
        runtime: AgentRuntime::new(llm, insights.clone(), sessions.clone()),
        insights,
        sessions,
        environment: config.server.environment,
    };
    Ok(Application { config, state })
}
