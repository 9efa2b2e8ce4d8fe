//! In-process link store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkSort, LinkSummary, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(Default)]
struct LinkTable {
    next_id: i64,
    rows: BTreeMap<i64, Link>,
    by_slug: HashMap<String, i64>,
}

impl LinkTable {
    fn matching<'a>(&'a self, filter: &'a LinkFilter) -> impl Iterator<Item = &'a Link> + 'a {
        let needle = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.rows.values().filter(move |link| {
            if let Some(active) = filter.active
                && link.active != active
            {
                return false;
            }
            match &needle {
                Some(needle) => {
                    link.slug.to_lowercase().contains(needle)
                        || link.target_url.to_lowercase().contains(needle)
                        || link
                            .metadata
                            .title
                            .as_deref()
                            .is_some_and(|t| t.to_lowercase().contains(needle))
                }
                None => true,
            }
        })
    }
}

/// Link store backed by a map behind a single `RwLock`.
///
/// Every mutation runs under the write lock, so the slug check and the insert
/// are one step and `visits + 1` cannot lose updates.
#[derive(Default)]
pub struct MemoryLinkRepository {
    table: RwLock<LinkTable>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut table = self.table.write().await;

        if table.by_slug.contains_key(&new_link.slug) {
            return Err(AppError::slug_taken(&new_link.slug));
        }

        table.next_id += 1;
        let id = table.next_id;
        let now = Utc::now();
        let link = Link {
            id,
            slug: new_link.slug,
            target_url: new_link.target_url,
            metadata: new_link.metadata,
            active: new_link.active,
            visits: 0,
            created_by: new_link.created_by,
            created_at: now,
            updated_at: now,
        };

        table.by_slug.insert(link.slug.clone(), id);
        table.rows.insert(id, link.clone());

        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .by_slug
            .get(slug)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        let mut table = self.table.write().await;

        let Some(old_slug) = table.rows.get(&id).map(|l| l.slug.clone()) else {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        };

        if let Some(slug) = &patch.slug
            && *slug != old_slug
        {
            if table.by_slug.contains_key(slug) {
                return Err(AppError::slug_taken(slug));
            }
            table.by_slug.remove(&old_slug);
            table.by_slug.insert(slug.clone(), id);
        }

        let link = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if let Some(slug) = patch.slug {
            link.slug = slug;
        }
        if let Some(target_url) = patch.target_url {
            link.target_url = target_url;
        }
        if let Some(metadata) = patch.metadata {
            link.metadata = metadata;
        }
        if let Some(active) = patch.active {
            link.active = active;
        }
        link.updated_at = Utc::now();

        Ok(link.clone())
    }

    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError> {
        let mut table = self.table.write().await;
        let removed = table.rows.remove(&id);
        if let Some(link) = &removed {
            table.by_slug.remove(&link.slug);
        }
        Ok(removed)
    }

    async fn increment_visits(&self, id: i64) -> Result<bool, AppError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(link) => {
                link.visits += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, filter: &LinkFilter) -> Result<Vec<Link>, AppError> {
        let table = self.table.read().await;
        let mut links: Vec<Link> = table.matching(filter).cloned().collect();

        match filter.sort {
            LinkSort::CreatedAt => {
                links.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
            }
            LinkSort::Visits => links.sort_by(|a, b| (b.visits, b.id).cmp(&(a.visits, a.id))),
        }

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(links
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &LinkFilter) -> Result<i64, AppError> {
        let table = self.table.read().await;
        Ok(table.matching(filter).count() as i64)
    }

    async fn summary(&self) -> Result<LinkSummary, AppError> {
        let table = self.table.read().await;
        let total = table.rows.len() as i64;
        let active = table.rows.values().filter(|l| l.active).count() as i64;
        let total_visits = table.rows.values().map(|l| l.visits).sum();

        Ok(LinkSummary {
            total,
            active,
            inactive: total - active,
            total_visits,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
