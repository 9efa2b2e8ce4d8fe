//! In-process cache implementation.

use super::service::{CacheResult, CacheService, FILL_GUARD};
use crate::domain::entities::ResolvedLink;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A cached resolution, or a tombstone when `link` is `None`.
#[derive(Debug, Clone)]
struct Slot {
    link: Option<ResolvedLink>,
    expires_at: Instant,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Slug cache held in a concurrent map.
///
/// Serves single-instance deployments without Redis. Expired slots are
/// replaced on the next fill of their slug and swept on every invalidation.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Slot>>,
    default_ttl: u64,
}

impl MemoryCache {
    pub fn new(default_ttl_seconds: u64) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            default_ttl: default_ttl_seconds,
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_link(&self, slug: &str) -> CacheResult<Option<ResolvedLink>> {
        let now = Instant::now();
        let hit = self
            .inner
            .get(slug)
            .filter(|slot| slot.is_live(now))
            .and_then(|slot| slot.link.clone());

        debug!(slug, hit = hit.is_some(), "Cache GET");
        Ok(hit)
    }

    async fn fill_link(&self, link: &ResolvedLink, ttl_seconds: Option<u64>) -> CacheResult<bool> {
        let ttl = Duration::from_secs(ttl_seconds.unwrap_or(self.default_ttl));
        let now = Instant::now();
        let slot = Slot {
            link: Some(link.clone()),
            expires_at: now + ttl,
        };

        // The entry guard holds the shard lock, so check and insert are atomic.
        let stored = match self.inner.entry(link.slug.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    false
                } else {
                    occupied.insert(slot);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                true
            }
        };

        debug!(slug = %link.slug, stored, "Cache FILL");
        Ok(stored)
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let now = Instant::now();
        self.inner.retain(|_, slot| slot.is_live(now));
        self.inner.insert(
            slug.to_string(),
            Slot {
                link: None,
                expires_at: now + FILL_GUARD,
            },
        );
        debug!(slug, "Cache INVALIDATE");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
