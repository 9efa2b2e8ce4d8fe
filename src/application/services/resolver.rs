//! Slug resolution for the public redirect path.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::domain::entities::{Resolution, ResolvedLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, FILL_GUARD};
use crate::utils::deadline::bounded;
use crate::utils::slug::is_valid_slug;

/// Maps a slug to its currently active target.
///
/// Lookups are read-only: resolving never changes `visits`. Accounting is
/// dispatched separately by the redirect handler once a link is found.
pub struct LinkResolver {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    storage_timeout: Duration,
}

impl LinkResolver {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            links,
            cache,
            storage_timeout,
        }
    }

    /// Resolves `slug` by exact, case-sensitive match.
    ///
    /// Absent and inactive links are both [`Resolution::NotFound`]. A slug that
    /// fails the format check resolves to `NotFound` without a storage call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] when storage times out and
    /// [`AppError::Internal`] on other storage failures.
    pub async fn resolve(&self, slug: &str) -> Result<Resolution, AppError> {
        if !is_valid_slug(slug) {
            debug!(slug, "Rejected malformed slug");
            return Ok(Resolution::NotFound);
        }

        match self.cache.get_link(slug).await {
            Ok(Some(cached)) => return Ok(Resolution::Found(cached)),
            Ok(None) => {}
            Err(e) => warn!(slug, error = %e, "Cache lookup failed, reading storage"),
        }

        let read_started = Instant::now();
        let link = bounded(self.storage_timeout, self.links.find_by_slug(slug)).await?;

        match link {
            Some(link) if link.active => {
                let resolved = link.resolved();
                self.fill(&resolved, read_started).await;
                Ok(Resolution::Found(resolved))
            }
            _ => Ok(Resolution::NotFound),
        }
    }

    /// Caches a storage hit unless the read is older than an invalidation
    /// tombstone could be.
    async fn fill(&self, resolved: &ResolvedLink, read_started: Instant) {
        if read_started.elapsed() >= FILL_GUARD {
            debug!(slug = %resolved.slug, "Storage read too old to cache");
            return;
        }

        match self.cache.fill_link(resolved, None).await {
            Ok(true) => {}
            Ok(false) => debug!(slug = %resolved.slug, "Cache already holds this slug"),
            Err(e) => warn!(slug = %resolved.slug, error = %e, "Failed to cache resolution"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Link, LinkMetadata};
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{CacheError, MockCacheService, NullCache};
    use chrono::Utc;

    fn link(slug: &str, active: bool) -> Link {
        Link {
            id: 7,
            slug: slug.to_string(),
            target_url: "https://example.com/landing".to_string(),
            metadata: LinkMetadata::default(),
            active,
            visits: 0,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn resolver(repo: MockLinkRepository) -> LinkResolver {
        LinkResolver::new(
            Arc::new(repo),
            Arc::new(NullCache::new()),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_active_link_is_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .withf(|slug| slug == "launch")
            .times(1)
            .returning(|s| Ok(Some(link(s, true))));

        let resolution = resolver(repo).resolve("launch").await.unwrap();

        match resolution {
            Resolution::Found(found) => {
                assert_eq!(found.link_id, 7);
                assert_eq!(found.target_url, "https://example.com/landing");
            }
            Resolution::NotFound => panic!("expected a match"),
        }
    }

    #[tokio::test]
    async fn test_inactive_link_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .returning(|s| Ok(Some(link(s, false))));

        let resolution = resolver(repo).resolve("paused").await.unwrap();

        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_absent_link_is_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug().returning(|_| Ok(None));

        let resolution = resolver(repo).resolve("missing").await.unwrap();

        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_malformed_slug_skips_storage() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug().never();

        let resolver = resolver(repo);
        let too_long = "a".repeat(65);

        for slug in ["", "has space", "dots.here", "ümlaut", too_long.as_str()] {
            assert_eq!(resolver.resolve(slug).await.unwrap(), Resolution::NotFound);
        }
    }

    #[tokio::test]
    async fn test_storage_error_is_not_a_miss() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .returning(|_| Err(AppError::internal("boom", serde_json::json!({}))));

        let err = resolver(repo).resolve("launch").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_storage() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug().never();

        let mut cache = MockCacheService::new();
        cache.expect_get_link().returning(|slug| {
            Ok(Some(ResolvedLink {
                link_id: 3,
                slug: slug.to_string(),
                target_url: "https://cached.example.com".to_string(),
                metadata: LinkMetadata::default(),
            }))
        });

        let resolver = LinkResolver::new(Arc::new(repo), Arc::new(cache), Duration::from_secs(1));

        match resolver.resolve("hot").await.unwrap() {
            Resolution::Found(found) => assert_eq!(found.link_id, 3),
            Resolution::NotFound => panic!("expected a cache hit"),
        }
    }

    #[tokio::test]
    async fn test_cache_failure_falls_back_to_storage() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .times(1)
            .returning(|s| Ok(Some(link(s, true))));

        let mut cache = MockCacheService::new();
        cache
            .expect_get_link()
            .returning(|_| Err(CacheError::ConnectionError("down".to_string())));
        cache
            .expect_fill_link()
            .returning(|_, _| Err(CacheError::ConnectionError("down".to_string())));

        let resolver = LinkResolver::new(Arc::new(repo), Arc::new(cache), Duration::from_secs(1));

        assert!(matches!(
            resolver.resolve("launch").await.unwrap(),
            Resolution::Found(_)
        ));
    }

    #[tokio::test]
    async fn test_inactive_link_is_not_cached() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .returning(|s| Ok(Some(link(s, false))));

        let mut cache = MockCacheService::new();
        cache.expect_get_link().returning(|_| Ok(None));
        cache.expect_fill_link().never();

        let resolver = LinkResolver::new(Arc::new(repo), Arc::new(cache), Duration::from_secs(1));

        assert_eq!(resolver.resolve("paused").await.unwrap(), Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_storage_hit_fills_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .times(1)
            .returning(|s| Ok(Some(link(s, true))));

        let mut cache = MockCacheService::new();
        cache.expect_get_link().returning(|_| Ok(None));
        cache
            .expect_fill_link()
            .withf(|resolved, ttl| resolved.slug == "launch" && ttl.is_none())
            .times(1)
            .returning(|_, _| Ok(true));

        let resolver = LinkResolver::new(Arc::new(repo), Arc::new(cache), Duration::from_secs(1));

        assert!(matches!(
            resolver.resolve("launch").await.unwrap(),
            Resolution::Found(_)
        ));
    }

    #[tokio::test]
    async fn test_rejected_fill_still_resolves() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_slug()
            .returning(|s| Ok(Some(link(s, true))));

        let mut cache = MockCacheService::new();
        cache.expect_get_link().returning(|_| Ok(None));
        cache.expect_fill_link().returning(|_, _| Ok(false));

        let resolver = LinkResolver::new(Arc::new(repo), Arc::new(cache), Duration::from_secs(1));

        match resolver.resolve("launch").await.unwrap() {
            Resolution::Found(found) => assert_eq!(found.link_id, 7),
            Resolution::NotFound => panic!("expected a match"),
        }
    }
}
