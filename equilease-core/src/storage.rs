use async_trait::async_trait;
use crate::repository::RepositoryResult;

/// Existence check against hosted object storage
#[async_trait]
pub trait BucketProbe: Send + Sync {
    async fn bucket_exists(&self, name: &str) -> RepositoryResult<bool>;
}
