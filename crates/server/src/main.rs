mod bootstrap;
mod error;
mod health;
mod routes;
mod session;
mod state;

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use triad_core::config::{AppConfig, LoadOptions};
use triad_store::spawn_sweeper;

fn init_logging(config: &AppConfig) {
    use triad_core::config::LogFormat::*;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let server = &app.config.server;

    if server.environment == triad_core::config::Environment::Production
        && server.origins_are_local_only()
    {
        tracing::warn!(
            event_name = "system.server.local_origins_in_production",
            origins = %server.allowed_origins.join(","),
            "production is running with localhost-only CORS origins"
        );
    }

    let sweeper = spawn_sweeper(
        app.state.insights.clone(),
        app.state.sessions.clone(),
        Duration::from_secs(app.config.session.sweep_interval_secs),
    );

    let address = format!("{}:{}", server.bind_address, server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = routes::router(app.state.clone(), &server.allowed_origins);

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        environment = server.environment.as_str(),
        origins = %server.allowed_origins.join(","),
        "triad-server listening"
    );
    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    sweeper.abort();
    tracing::info!(event_name = "system.server.stopping", "triad-server stopping");

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %error,
            "could not listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
