//! Cache that never stores anything.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::ResolvedLink;
use async_trait::async_trait;

/// Stand-in when `REDIS_URL` is unset or Redis is unreachable at startup.
///
/// Every lookup misses, so each redirect reads the link store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl NullCache {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_link(&self, _slug: &str) -> CacheResult<Option<ResolvedLink>> {
        Ok(None)
    }

    async fn fill_link(&self, _link: &ResolvedLink, _ttl_seconds: Option<u64>) -> CacheResult<bool> {
        Ok(false)
    }

    async fn invalidate(&self, _slug: &str) -> CacheResult<()> {
        Ok(())
    }

    // Nothing to be unreachable.
    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::LinkMetadata;

    #[tokio::test]
    async fn test_fill_then_get_still_misses() {
        let cache = NullCache::new();
        let link = ResolvedLink {
            link_id: 1,
            slug: "launch".to_string(),
            target_url: "https://acme.test".to_string(),
            metadata: LinkMetadata::default(),
        };

        assert!(!cache.fill_link(&link, Some(60)).await.unwrap());

        assert!(cache.get_link("launch").await.unwrap().is_none());
        assert!(cache.health_check().await);
    }
}
