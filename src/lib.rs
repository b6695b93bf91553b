//! Optimistic mutation and cache-consistency engine.
//!
//! Consumers read observable cache entries from [`CacheStore`] and submit
//! actions through [`MutationHandler`]; the [`MutationCoordinator`] applies
//! each action to the cache immediately, confirms it with the server and
//! then reconciles or rolls back.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod state;

pub use application::services::{MutationCoordinator, MutationOutcome, RetryPolicy};
pub use infrastructure::cache::CacheStore;
pub use presentation::dto::{ActionRequest, ApiResponse, MutationOutcomeDto};
pub use presentation::handlers::MutationHandler;
pub use shared::config::{EngineConfig, LoggingConfig};
pub use shared::error::{AppError, MutationError};
pub use state::EngineState;

/// Installs the global tracing subscriber. `RUST_LOG` wins over the configured filter.
///
/// Returns quietly when a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
