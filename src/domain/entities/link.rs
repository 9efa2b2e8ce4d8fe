//! Link entity: a slug mapped to a target URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open Graph style preview data attached to a link.
///
/// Only used for link previews, never for resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// A branded link.
///
/// `id`, `created_at` and `created_by` are fixed at creation. `visits` only
/// ever grows, through the storage-level atomic increment.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub target_url: String,
    pub metadata: LinkMetadata,
    pub active: bool,
    pub visits: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Projection handed to the redirect path.
    pub fn resolved(&self) -> ResolvedLink {
        ResolvedLink {
            link_id: self.id,
            slug: self.slug.clone(),
            target_url: self.target_url.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Input data for inserting a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub slug: String,
    pub target_url: String,
    pub metadata: LinkMetadata,
    pub active: bool,
    pub created_by: i64,
}

/// Partial update for an existing link. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub slug: Option<String>,
    pub target_url: Option<String>,
    /// Replaces the whole metadata record when present.
    pub metadata: Option<LinkMetadata>,
    pub active: Option<bool>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.target_url.is_none()
            && self.metadata.is_none()
            && self.active.is_none()
    }
}

/// What a successful resolution yields: enough to redirect and to account the visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub link_id: i64,
    pub slug: String,
    pub target_url: String,
    pub metadata: LinkMetadata,
}

/// Outcome of a slug lookup.
///
/// Absent and inactive links both map to `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResolvedLink),
    NotFound,
}

/// Sort order for link listings. Always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSort {
    #[default]
    CreatedAt,
    Visits,
}

/// Search, filter and pagination criteria for listing links.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkFilter {
    /// Case-insensitive substring over slug, target URL and title.
    pub search: Option<String>,
    /// Exact match on the active flag.
    pub active: Option<bool>,
    pub sort: LinkSort,
    pub page: u32,
    pub limit: u32,
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self {
            search: None,
            active: None,
            sort: LinkSort::CreatedAt,
            page: 1,
            limit: 20,
        }
    }
}

impl LinkFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// Aggregate counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub total_visits: i64,
}
