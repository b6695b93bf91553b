use crate::{
    application::services::MutationCoordinator,
    domain::{
        entities::{CacheValue, SuggestionEntry},
        value_objects::CacheKey,
    },
    infrastructure::cache::CacheStatus,
    presentation::dto::{ActionRequest, ApiResponse, MutationOutcomeDto, Validate},
    shared::{
        error::MutationError,
        metrics::{self, MutationMetricsSnapshot},
    },
};
use std::sync::Arc;
use tokio::sync::watch;

/// Entry point for consumers: actions go in, observable cache values come out.
pub struct MutationHandler {
    coordinator: Arc<MutationCoordinator>,
}

impl MutationHandler {
    pub fn new(coordinator: Arc<MutationCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn perform(&self, request: ActionRequest) -> ApiResponse<MutationOutcomeDto> {
        ApiResponse::from_result(self.run(request).await)
    }

    async fn run(&self, request: ActionRequest) -> Result<MutationOutcomeDto, MutationError> {
        request.validate().map_err(MutationError::InvalidOperation)?;

        let action = request.kind();
        let (adapter, target) = request
            .into_adapter()
            .map_err(MutationError::InvalidOperation)?;
        let target_id = target.to_string();
        let outcome = self.coordinator.perform(adapter, target).await?;

        Ok(MutationOutcomeDto {
            action,
            target_id,
            outcome,
        })
    }

    pub fn read(&self, key: &CacheKey) -> Option<CacheValue> {
        self.coordinator.store().read(key)
    }

    pub fn subscribe(&self, key: &CacheKey) -> watch::Receiver<Option<CacheValue>> {
        self.coordinator.store().subscribe(key)
    }

    /// Suggestion rows joined with the canonical follower summaries.
    pub fn suggestions(&self) -> Option<Vec<SuggestionEntry>> {
        self.coordinator.store().suggestions()
    }

    pub fn status(&self) -> CacheStatus {
        self.coordinator.store().status()
    }

    pub fn pending_mutations(&self) -> usize {
        self.coordinator.pending_attempts()
    }

    pub fn metrics(&self) -> MutationMetricsSnapshot {
        metrics::snapshot()
    }
}
