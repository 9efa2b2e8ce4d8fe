//! Repository trait for the link store.

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkSummary, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Persistent store of slug to target mappings.
///
/// Implementations must provide:
/// - exact-match lookup by slug
/// - a uniqueness constraint on `slug` enforced at insert/update time
/// - an atomic `visits + 1` increment
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryLinkRepository`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug is already taken. The check is
    /// the storage uniqueness constraint itself, so concurrent inserts of the
    /// same slug yield exactly one success.
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Finds a link by slug (exact, case-sensitive).
    ///
    /// Inactive links are returned too; gating is the resolver's job.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError>;

    /// Partially updates a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    /// Returns [`AppError::Conflict`] if the new slug belongs to another link.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError>;

    /// Permanently deletes a link, returning the removed row.
    ///
    /// Returns `Ok(None)` if no link has this id.
    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Atomically adds one to the visit counter.
    ///
    /// Returns `Ok(false)` if the link no longer exists.
    async fn increment_visits(&self, id: i64) -> Result<bool, AppError>;

    /// Lists one page of links matching the filter.
    async fn list(&self, filter: &LinkFilter) -> Result<Vec<Link>, AppError>;

    /// Counts all links matching the filter, ignoring pagination.
    async fn count(&self, filter: &LinkFilter) -> Result<i64, AppError>;

    /// Aggregate counters for the dashboard.
    async fn summary(&self) -> Result<LinkSummary, AppError>;

    /// Connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
