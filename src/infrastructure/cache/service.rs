//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::ResolvedLink;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// How long an invalidation blocks fills for its slug.
///
/// A resolve whose storage read started before an update or delete may try to
/// fill the cache after the invalidation. The tombstone written by
/// [`CacheService::invalidate`] makes that fill a no-op, and resolvers skip
/// the fill altogether once their read took longer than this.
pub const FILL_GUARD: Duration = Duration::from_secs(10);

/// Slug-keyed cache in front of the link store's redirect lookups.
///
/// Only active links are ever cached. Failures degrade to storage lookups, so
/// callers treat any error as a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process map
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached resolution for `slug`, `Ok(None)` on a miss or
    /// while a tombstone is in place.
    async fn get_link(&self, slug: &str) -> CacheResult<Option<ResolvedLink>>;

    /// Stores a resolution under its slug unless the slug already has an
    /// entry or a tombstone. Returns whether the entry was written.
    ///
    /// `ttl_seconds = None` uses the implementation's default TTL.
    async fn fill_link(&self, link: &ResolvedLink, ttl_seconds: Option<u64>) -> CacheResult<bool>;

    /// Replaces any entry for `slug` with a tombstone lasting [`FILL_GUARD`].
    /// Called after a link is updated or deleted.
    async fn invalidate(&self, slug: &str) -> CacheResult<()>;

    /// Reported by the health endpoint.
    async fn health_check(&self) -> bool;
}
