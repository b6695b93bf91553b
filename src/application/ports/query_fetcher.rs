use crate::domain::entities::CacheValue;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Loads the server's current value for a cache key (background refresh).
#[async_trait]
pub trait QueryFetcher: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, AppError>;
}
