pub mod repositories;
pub mod sweeper;

pub use repositories::{
    InMemoryInsightRepository, InMemorySessionStore, InsightRepository, RepositoryError,
    ServiceStats, SessionStore, SessionSummary,
};
pub use sweeper::{spawn_sweeper, sweep_once};
