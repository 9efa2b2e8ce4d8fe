//! Link registry: authorized create, update, delete and listing.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::services::SettingsService;
use crate::domain::entities::{
    Identity, Link, LinkFilter, LinkMetadata, LinkPatch, LinkSort, LinkSummary, NewLink,
    Paginated,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::deadline::bounded;
use crate::utils::slug::{generate_slug, slug_error};
use crate::utils::validation::{FieldErrors, check_metadata, check_pagination};

/// Attempts at drawing a free random slug before giving up.
const MAX_SLUG_ATTEMPTS: usize = 10;

pub const DEFAULT_DASHBOARD_TOP: u32 = 5;
pub const MAX_DASHBOARD_TOP: u32 = 50;

/// Input for [`LinkService::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    /// Generated when omitted.
    pub slug: Option<String>,
    pub target_url: String,
    pub metadata: Option<LinkMetadata>,
    /// Defaults to the `default_active` site setting.
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: LinkSummary,
    pub top_links: Vec<Link>,
}

/// Blank strings count as absent.
fn normalize_metadata(metadata: LinkMetadata) -> LinkMetadata {
    let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    LinkMetadata {
        title: keep(metadata.title),
        description: keep(metadata.description),
        image: keep(metadata.image),
    }
}

/// Service for managing links on behalf of an authenticated identity.
///
/// Every operation checks the caller's capability before touching storage.
/// Mutations require admin; reads are open to any authenticated identity.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    settings: Arc<SettingsService>,
    storage_timeout: Duration,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        settings: Arc<SettingsService>,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            links,
            cache,
            settings,
            storage_timeout,
        }
    }

    /// Creates a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless the caller is an admin.
    /// Returns [`AppError::Validation`] listing every invalid field.
    /// Returns [`AppError::Conflict`] if the requested slug is taken.
    pub async fn create(&self, actor: &Identity, input: CreateLink) -> Result<Link, AppError> {
        actor.require_admin()?;

        let mut errors = FieldErrors::new();
        if let Some(slug) = &input.slug {
            errors.check("slug", slug_error(slug));
        }
        let target_url = errors.http_url("target_url", &input.target_url);
        let metadata = check_metadata(
            &mut errors,
            normalize_metadata(input.metadata.unwrap_or_default()),
        );
        errors.into_result()?;

        let active = match input.active {
            Some(active) => active,
            None => self.settings.current().await?.default_active,
        };

        let link = match input.slug {
            Some(slug) => {
                let new_link = NewLink {
                    slug,
                    target_url,
                    metadata,
                    active,
                    created_by: actor.admin_id,
                };
                bounded(self.storage_timeout, self.links.create(new_link)).await?
            }
            None => {
                self.create_with_generated_slug(actor, target_url, metadata, active)
                    .await?
            }
        };

        info!(link_id = link.id, slug = %link.slug, admin_id = actor.admin_id, "Link created");
        Ok(link)
    }

    /// Draws random slugs until the storage constraint accepts one.
    async fn create_with_generated_slug(
        &self,
        actor: &Identity,
        target_url: String,
        metadata: LinkMetadata,
        active: bool,
    ) -> Result<Link, AppError> {
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let new_link = NewLink {
                slug: generate_slug()?,
                target_url: target_url.clone(),
                metadata: metadata.clone(),
                active,
                created_by: actor.admin_id,
            };

            match bounded(self.storage_timeout, self.links.create(new_link)).await {
                Err(AppError::Conflict { .. }) => continue,
                other => return other,
            }
        }

        Err(AppError::internal(
            "Failed to generate unique slug",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Applies a partial update.
    ///
    /// Cached resolutions for both the previous and the new slug are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`], [`AppError::Validation`],
    /// [`AppError::NotFound`] or [`AppError::Conflict`].
    pub async fn update(
        &self,
        actor: &Identity,
        id: i64,
        patch: LinkPatch,
    ) -> Result<Link, AppError> {
        actor.require_admin()?;

        let mut errors = FieldErrors::new();
        if patch.is_empty() {
            errors.add("patch", "At least one field must be provided");
        }
        if let Some(slug) = &patch.slug {
            errors.check("slug", slug_error(slug));
        }
        let patch = LinkPatch {
            target_url: patch
                .target_url
                .map(|url| errors.http_url("target_url", &url)),
            metadata: patch
                .metadata
                .map(|metadata| check_metadata(&mut errors, normalize_metadata(metadata))),
            ..patch
        };
        errors.into_result()?;

        let existing = bounded(self.storage_timeout, self.links.find_by_id(id))
            .await?
            .ok_or_else(|| link_id_not_found(id))?;

        let updated = bounded(self.storage_timeout, self.links.update(id, patch)).await?;

        self.invalidate(&existing.slug).await;
        if updated.slug != existing.slug {
            self.invalidate(&updated.slug).await;
        }

        info!(link_id = id, slug = %updated.slug, admin_id = actor.admin_id, "Link updated");
        Ok(updated)
    }

    /// Permanently deletes a link. The slug becomes available immediately.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] unless the caller is an admin, and
    /// [`AppError::NotFound`] if no link has this id.
    pub async fn delete(&self, actor: &Identity, id: i64) -> Result<Link, AppError> {
        actor.require_admin()?;

        let removed = bounded(self.storage_timeout, self.links.delete(id))
            .await?
            .ok_or_else(|| link_id_not_found(id))?;

        self.invalidate(&removed.slug).await;

        info!(link_id = id, slug = %removed.slug, admin_id = actor.admin_id, "Link deleted");
        Ok(removed)
    }

    pub async fn get(&self, _actor: &Identity, id: i64) -> Result<Link, AppError> {
        bounded(self.storage_timeout, self.links.find_by_id(id))
            .await?
            .ok_or_else(|| link_id_not_found(id))
    }

    /// Lists one page of links with totals.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `page` or `limit` is out of range.
    pub async fn list(
        &self,
        _actor: &Identity,
        filter: LinkFilter,
    ) -> Result<Paginated<Link>, AppError> {
        let mut errors = FieldErrors::new();
        check_pagination(&mut errors, filter.page, filter.limit);
        errors.into_result()?;

        let (items, total) = tokio::try_join!(
            bounded(self.storage_timeout, self.links.list(&filter)),
            bounded(self.storage_timeout, self.links.count(&filter)),
        )?;

        Ok(Paginated::new(items, filter.page, filter.limit, total))
    }

    /// Aggregate counters plus the `top` most visited links.
    pub async fn dashboard(&self, _actor: &Identity, top: Option<u32>) -> Result<Dashboard, AppError> {
        let top = top.unwrap_or(DEFAULT_DASHBOARD_TOP);
        if !(1..=MAX_DASHBOARD_TOP).contains(&top) {
            return Err(AppError::bad_request(
                "Validation failed",
                json!({ "fields": { "top": format!("Top must be between 1 and {MAX_DASHBOARD_TOP}") } }),
            ));
        }

        let filter = LinkFilter {
            sort: LinkSort::Visits,
            limit: top,
            ..LinkFilter::default()
        };

        let (summary, top_links) = tokio::try_join!(
            bounded(self.storage_timeout, self.links.summary()),
            bounded(self.storage_timeout, self.links.list(&filter)),
        )?;

        Ok(Dashboard { summary, top_links })
    }

    async fn invalidate(&self, slug: &str) {
        if let Err(e) = self.cache.invalidate(slug).await {
            warn!(slug, error = %e, "Failed to invalidate cached resolution");
        }
    }
}

fn link_id_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Role, SiteSettings};
    use crate::domain::repositories::{MockLinkRepository, MockSettingsRepository};
    use crate::infrastructure::cache::{MockCacheService, NullCache};
    use chrono::Utc;

    fn actor(role: Role) -> Identity {
        Identity {
            admin_id: 1,
            email: "editor@example.com".to_string(),
            role,
        }
    }

    fn settings(default_active: bool) -> Arc<SettingsService> {
        let mut repo = MockSettingsRepository::new();
        repo.expect_load().returning(|| Ok(None));
        Arc::new(SettingsService::new(
            Arc::new(repo),
            SiteSettings {
                site_name: "Links".to_string(),
                support_email: "help@example.com".to_string(),
                base_domain: "go.example.com".to_string(),
                default_active,
                redirect_delay_seconds: 0,
            },
            Duration::from_secs(1),
        ))
    }

    fn service(repo: MockLinkRepository) -> LinkService {
        LinkService::new(
            Arc::new(repo),
            Arc::new(NullCache::new()),
            settings(true),
            Duration::from_secs(1),
        )
    }

    fn stored(new_link: NewLink) -> Link {
        Link {
            id: 10,
            slug: new_link.slug,
            target_url: new_link.target_url,
            metadata: new_link.metadata,
            active: new_link.active,
            visits: 0,
            created_by: new_link.created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn existing(id: i64, slug: &str) -> Link {
        Link {
            id,
            slug: slug.to_string(),
            target_url: "https://example.com".to_string(),
            metadata: LinkMetadata::default(),
            active: true,
            visits: 0,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_with_explicit_slug() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .withf(|l| l.slug == "launch" && l.created_by == 1 && l.active)
            .times(1)
            .returning(|l| Ok(stored(l)));

        let input = CreateLink {
            slug: Some("launch".to_string()),
            target_url: "https://example.com/launch".to_string(),
            ..CreateLink::default()
        };
        let link = service(repo).create(&actor(Role::Admin), input).await.unwrap();

        assert_eq!(link.slug, "launch");
        assert_eq!(link.visits, 0);
    }

    #[tokio::test]
    async fn test_create_stores_encoded_target() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .withf(|l| {
                l.target_url == "https://example.com/caf%C3%A9/ab"
                    && l.metadata.image.as_deref() == Some("https://cdn.example.com/%C3%BC.png")
            })
            .times(1)
            .returning(|l| Ok(stored(l)));

        let input = CreateLink {
            slug: Some("cafe".to_string()),
            target_url: "https://example.com/café/a\tb".to_string(),
            metadata: Some(LinkMetadata {
                image: Some("https://cdn.example.com/ü.png".to_string()),
                ..LinkMetadata::default()
            }),
            active: None,
        };
        let link = service(repo).create(&actor(Role::Admin), input).await.unwrap();

        assert_eq!(link.target_url, "https://example.com/caf%C3%A9/ab");
    }

    #[tokio::test]
    async fn test_update_stores_encoded_target() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, "launch"))));
        repo.expect_update()
            .withf(|_, patch| patch.target_url.as_deref() == Some("https://example.com/ab?q=%C3%BC"))
            .times(1)
            .returning(|id, patch| {
                let mut link = existing(id, "launch");
                link.target_url = patch.target_url.unwrap_or(link.target_url);
                Ok(link)
            });

        let patch = LinkPatch {
            target_url: Some("https://example.com/a\nb?q=ü".to_string()),
            ..LinkPatch::default()
        };
        let link = service(repo)
            .update(&actor(Role::Admin), 4, patch)
            .await
            .unwrap();

        assert_eq!(link.target_url, "https://example.com/ab?q=%C3%BC");
    }

    #[tokio::test]
    async fn test_create_forbidden_for_user_role() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().never();

        let input = CreateLink {
            slug: Some("launch".to_string()),
            target_url: "https://example.com".to_string(),
            ..CreateLink::default()
        };
        let err = service(repo)
            .create(&actor(Role::User), input)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_create_collects_all_field_errors() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().never();

        let input = CreateLink {
            slug: Some("bad slug!".to_string()),
            target_url: "ftp://example.com".to_string(),
            metadata: Some(LinkMetadata {
                image: Some("nope".to_string()),
                ..LinkMetadata::default()
            }),
            active: None,
        };
        let err = service(repo)
            .create(&actor(Role::Admin), input)
            .await
            .unwrap_err();

        match err {
            AppError::Validation { details, .. } => {
                let fields = &details["fields"];
                assert!(fields["slug"].is_string());
                assert!(fields["target_url"].is_string());
                assert!(fields["metadata.image"].is_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_reserved_slug() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create().never();

        let input = CreateLink {
            slug: Some("api".to_string()),
            target_url: "https://example.com".to_string(),
            ..CreateLink::default()
        };
        let err = service(repo)
            .create(&actor(Role::Admin), input)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_uses_default_active_setting() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .withf(|l| !l.active)
            .returning(|l| Ok(stored(l)));

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(NullCache::new()),
            settings(false),
            Duration::from_secs(1),
        );
        let input = CreateLink {
            slug: Some("draft".to_string()),
            target_url: "https://example.com".to_string(),
            ..CreateLink::default()
        };

        assert!(!service.create(&actor(Role::Admin), input).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_create_generates_slug_and_retries_on_collision() {
        let mut repo = MockLinkRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Err(AppError::slug_taken(&l.slug)));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Ok(stored(l)));

        let input = CreateLink {
            target_url: "https://example.com".to_string(),
            ..CreateLink::default()
        };
        let link = service(repo).create(&actor(Role::Admin), input).await.unwrap();

        assert_eq!(link.slug.len(), 8);
    }

    #[tokio::test]
    async fn test_explicit_slug_conflict_is_not_retried() {
        let mut repo = MockLinkRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|l| Err(AppError::slug_taken(&l.slug)));

        let input = CreateLink {
            slug: Some("taken".to_string()),
            target_url: "https://example.com".to_string(),
            ..CreateLink::default()
        };
        let err = service(repo)
            .create(&actor(Role::Admin), input)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_invalidates_old_and_new_slug() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, "old"))));
        repo.expect_update().returning(|id, patch| {
            let mut link = existing(id, "old");
            link.slug = patch.slug.unwrap_or(link.slug);
            Ok(link)
        });

        let mut cache = MockCacheService::new();
        cache
            .expect_invalidate()
            .withf(|slug| slug == "old")
            .times(1)
            .returning(|_| Ok(()));
        cache
            .expect_invalidate()
            .withf(|slug| slug == "new")
            .times(1)
            .returning(|_| Ok(()));

        let service = LinkService::new(
            Arc::new(repo),
            Arc::new(cache),
            settings(true),
            Duration::from_secs(1),
        );
        let patch = LinkPatch {
            slug: Some("new".to_string()),
            ..LinkPatch::default()
        };

        let link = service.update(&actor(Role::Admin), 4, patch).await.unwrap();
        assert_eq!(link.slug, "new");
    }

    #[tokio::test]
    async fn test_update_missing_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_update().never();

        let patch = LinkPatch {
            active: Some(false),
            ..LinkPatch::default()
        };
        let err = service(repo)
            .update(&actor(Role::Admin), 99, patch)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_id().never();

        let err = service(repo)
            .update(&actor(Role::Admin), 1, LinkPatch::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete().returning(|_| Ok(None));

        let err = service(repo)
            .delete(&actor(Role::SuperAdmin), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_forbidden_for_user_role() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete().never();

        let err = service(repo)
            .delete(&actor(Role::User), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_list_validates_limit() {
        let mut repo = MockLinkRepository::new();
        repo.expect_list().never();

        let filter = LinkFilter {
            limit: 500,
            ..LinkFilter::default()
        };
        let err = service(repo)
            .list(&actor(Role::User), filter)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_returns_totals() {
        let mut repo = MockLinkRepository::new();
        repo.expect_list()
            .returning(|_| Ok(vec![existing(1, "a"), existing(2, "b")]));
        repo.expect_count().returning(|_| Ok(45));

        let filter = LinkFilter {
            limit: 2,
            ..LinkFilter::default()
        };
        let page = service(repo).list(&actor(Role::User), filter).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 23);
    }

    #[tokio::test]
    async fn test_dashboard_top_bounds() {
        let mut repo = MockLinkRepository::new();
        repo.expect_summary().never();

        let err = service(repo)
            .dashboard(&actor(Role::User), Some(51))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_dashboard_lists_by_visits() {
        let mut repo = MockLinkRepository::new();
        repo.expect_summary().returning(|| {
            Ok(LinkSummary {
                total: 3,
                active: 2,
                inactive: 1,
                total_visits: 12,
            })
        });
        repo.expect_list()
            .withf(|f| f.sort == LinkSort::Visits && f.limit == DEFAULT_DASHBOARD_TOP)
            .returning(|_| Ok(vec![existing(1, "popular")]));

        let dashboard = service(repo)
            .dashboard(&actor(Role::User), None)
            .await
            .unwrap();

        assert_eq!(dashboard.summary.total_visits, 12);
        assert_eq!(dashboard.top_links[0].slug, "popular");
    }
}
