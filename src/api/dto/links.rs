//! DTOs for link management, dashboard and preview endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::api::dto::pagination::PaginationParams;
use crate::application::services::{CreateLink, Dashboard};
use crate::domain::entities::{
    Link, LinkFilter, LinkMetadata, LinkPatch, LinkSort, LinkSummary, ResolvedLink, SiteSettings,
};

/// Request body for `POST /api/links`.
///
/// Field-level rules (slug format, URL scheme, metadata limits) are enforced
/// by the link registry; this only rejects obviously oversized input.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Generated when omitted.
    #[validate(length(max = 256))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 2048))]
    pub target_url: String,

    #[serde(default)]
    pub metadata: Option<LinkMetadata>,

    /// Defaults to the `default_active` site setting.
    pub active: Option<bool>,
}

impl From<CreateLinkRequest> for CreateLink {
    fn from(req: CreateLinkRequest) -> Self {
        Self {
            slug: req.slug,
            target_url: req.target_url,
            metadata: req.metadata,
            active: req.active,
        }
    }
}

/// Request body for `PATCH /api/links/{id}`.
///
/// All fields are optional, only provided fields are changed. `metadata`
/// replaces the stored metadata as a whole.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(length(max = 256))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 2048))]
    pub target_url: Option<String>,

    pub metadata: Option<LinkMetadata>,

    pub active: Option<bool>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            slug: req.slug,
            target_url: req.target_url,
            metadata: req.metadata,
            active: req.active,
        }
    }
}

/// Query parameters for `GET /api/links`.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct LinkListQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub active: Option<bool>,

    pub sort: Option<LinkSort>,
}

impl LinkListQuery {
    pub fn into_filter(self) -> LinkFilter {
        let (page, limit) = self.pagination.resolve();
        LinkFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            active: self.active,
            sort: self.sort.unwrap_or_default(),
            page,
            limit,
        }
    }
}

/// A link as returned by the API, with its public short URL.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub slug: String,
    pub short_url: String,
    pub target_url: String,
    pub metadata: LinkMetadata,
    pub active: bool,
    pub visits: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(link: Link, settings: &SiteSettings) -> Self {
        Self {
            short_url: settings.short_url(&link.slug),
            id: link.id,
            slug: link.slug,
            target_url: link.target_url,
            metadata: link.metadata,
            active: link.active,
            visits: link.visits,
            created_by: link.created_by,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub top: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub summary: LinkSummary,
    pub top_links: Vec<LinkResponse>,
}

impl DashboardResponse {
    pub fn new(dashboard: Dashboard, settings: &SiteSettings) -> Self {
        Self {
            summary: dashboard.summary,
            top_links: dashboard
                .top_links
                .into_iter()
                .map(|link| LinkResponse::new(link, settings))
                .collect(),
        }
    }
}

/// Body of `GET /preview/{slug}`: what a preview page needs to render.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub slug: String,
    pub short_url: String,
    pub target_url: String,
    pub metadata: LinkMetadata,
    pub site_name: String,
    pub redirect_delay_seconds: u32,
}

impl PreviewResponse {
    pub fn new(link: ResolvedLink, settings: &SiteSettings) -> Self {
        Self {
            short_url: settings.short_url(&link.slug),
            slug: link.slug,
            target_url: link.target_url,
            metadata: link.metadata,
            site_name: settings.site_name.clone(),
            redirect_delay_seconds: settings.redirect_delay_seconds,
        }
    }
}
