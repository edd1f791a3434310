use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use equilease_core::{BucketProbe, RepositoryResult};

/// Memoizes storage bucket existence checks.
///
/// Only buckets that were found are remembered, since a missing bucket may be
/// created at any time. The memo lives as long as the cache handle and is
/// cleared by [`BucketCache::reset`].
pub struct BucketCache {
    probe: Arc<dyn BucketProbe>,
    known: RwLock<HashSet<String>>,
}

impl BucketCache {
    pub fn new(probe: Arc<dyn BucketProbe>) -> Self {
        Self {
            probe,
            known: RwLock::new(HashSet::new()),
        }
    }

    pub async fn exists(&self, name: &str) -> RepositoryResult<bool> {
        if self.known.read().await.contains(name) {
            return Ok(true);
        }

        let exists = self.probe.bucket_exists(name).await?;
        if exists {
            self.known.write().await.insert(name.to_string());
        } else {
            tracing::debug!(bucket = name, "Bucket not found");
        }

        Ok(exists)
    }

    pub async fn reset(&self) {
        let mut known = self.known.write().await;
        tracing::info!(cleared = known.len(), "Bucket cache reset");
        known.clear();
    }

    /// Buckets currently memoized, sorted
    pub async fn cached(&self) -> Vec<String> {
        let mut names: Vec<String> = self.known.read().await.iter().cloned().collect();
        names.sort();
        names
    }
}
