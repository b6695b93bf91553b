use crate::application::ports::{CredentialProvider, QueryFetcher, Transport};
use crate::application::services::{MutationCoordinator, RetryPolicy};
use crate::infrastructure::cache::CacheStore;
use crate::infrastructure::http::{HttpQueryFetcher, HttpTransport};
use crate::infrastructure::idempotency::UuidTokenSource;
use crate::presentation::handlers::MutationHandler;
use crate::shared::config::EngineConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Wires the store, coordinator and handler from one configuration.
pub struct EngineState {
    pub config: EngineConfig,
    pub store: CacheStore,
    pub coordinator: Arc<MutationCoordinator>,
    pub mutation_handler: Arc<MutationHandler>,
    gc_task: Option<JoinHandle<()>>,
}

impl EngineState {
    pub fn new(
        config: EngineConfig,
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn Transport>,
        fetcher: Arc<dyn QueryFetcher>,
    ) -> Self {
        let store = CacheStore::new(fetcher, Duration::from_secs(config.cache.retention_secs));
        let gc_task = store.spawn_gc(Duration::from_secs(config.cache.gc_interval_secs));

        let coordinator = Arc::new(
            MutationCoordinator::new(
                store.clone(),
                transport,
                credentials,
                Arc::new(UuidTokenSource),
            )
            .with_retry_policy(RetryPolicy::from(&config.retry)),
        );
        let mutation_handler = Arc::new(MutationHandler::new(Arc::clone(&coordinator)));

        Self {
            config,
            store,
            coordinator,
            mutation_handler,
            gc_task,
        }
    }

    /// Builds an engine talking HTTP to `config.http.base_url`.
    pub fn from_config(
        config: EngineConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.http)?);
        let fetcher = Arc::new(HttpQueryFetcher::new(
            Arc::clone(&transport),
            Arc::clone(&credentials),
        ));
        info!(base_url = %config.http.base_url, "optimistic sync engine configured");

        Ok(Self::new(config, credentials, transport, fetcher))
    }
}

impl Drop for EngineState {
    fn drop(&mut self) {
        if let Some(task) = self.gc_task.take() {
            task.abort();
        }
    }
}
