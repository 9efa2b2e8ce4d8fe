//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{
    Link, LinkFilter, LinkMetadata, LinkPatch, LinkSort, LinkSummary, NewLink,
};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on;

const SLUG_CONSTRAINT: &str = "links_slug_key";

const LINK_COLUMNS: &str = "id, slug, target_url, title, description, image, active, visits, \
                            created_by, created_at, updated_at";

#[derive(Debug, FromRow)]
struct LinkRow {
    id: i64,
    slug: String,
    target_url: String,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    active: bool,
    visits: i64,
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            slug: r.slug,
            target_url: r.target_url,
            metadata: LinkMetadata {
                title: r.title,
                description: r.description,
                image: r.image,
            },
            active: r.active,
            visits: r.visits,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    total: i64,
    active: i64,
    total_visits: i64,
}

/// Escapes `%`, `_` and `\` so user input is matched literally by `ILIKE`.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn order_clause(sort: LinkSort) -> &'static str {
    match sort {
        LinkSort::CreatedAt => " ORDER BY created_at DESC, id DESC",
        LinkSort::Visits => " ORDER BY visits DESC, id DESC",
    }
}

/// Appends the `WHERE` clause shared by `list` and `count`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LinkFilter) {
    qb.push(" WHERE TRUE");

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (slug ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR target_url ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(title, '') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(active) = filter.active {
        qb.push(" AND active = ").push_bind(active);
    }
}

/// PostgreSQL repository for links.
///
/// Slug uniqueness is the `links_slug_key` constraint; visit counting is a
/// single `UPDATE ... SET visits = visits + 1`, so concurrent increments
/// never lose updates.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            "INSERT INTO links (slug, target_url, title, description, image, active, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.slug)
            .bind(&new_link.target_url)
            .bind(&new_link.metadata.title)
            .bind(&new_link.metadata.description)
            .bind(&new_link.metadata.image)
            .bind(new_link.active)
            .bind(new_link.created_by)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on(&e, SLUG_CONSTRAINT) {
                    AppError::slug_taken(&new_link.slug)
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE slug = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<Link, AppError> {
        let update_metadata = patch.metadata.is_some();
        let metadata = patch.metadata.unwrap_or_default();

        let sql = format!(
            "UPDATE links SET \
                slug        = COALESCE($2::TEXT, slug), \
                target_url  = COALESCE($3::TEXT, target_url), \
                title       = CASE WHEN $4 THEN $5::TEXT ELSE title END, \
                description = CASE WHEN $4 THEN $6::TEXT ELSE description END, \
                image       = CASE WHEN $4 THEN $7::TEXT ELSE image END, \
                active      = COALESCE($8::BOOLEAN, active), \
                updated_at  = NOW() \
             WHERE id = $1 \
             RETURNING {LINK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(&patch.slug)
            .bind(&patch.target_url)
            .bind(update_metadata)
            .bind(&metadata.title)
            .bind(&metadata.description)
            .bind(&metadata.image)
            .bind(patch.active)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| match &patch.slug {
                Some(slug) if is_unique_violation_on(&e, SLUG_CONSTRAINT) => {
                    AppError::slug_taken(slug)
                }
                _ => AppError::from(e),
            })?;

        row.map(Link::from)
            .ok_or_else(|| AppError::not_found("Link not found", serde_json::json!({ "id": id })))
    }

    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("DELETE FROM links WHERE id = $1 RETURNING {LINK_COLUMNS}");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn increment_visits(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE links SET visits = visits + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &LinkFilter) -> Result<Vec<Link>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {LINK_COLUMNS} FROM links"));
        push_filter(&mut qb, filter);
        qb.push(order_clause(filter.sort));
        qb.push(" LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows = qb
            .build_query_as::<LinkRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn count(&self, filter: &LinkFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM links");
        push_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn summary(&self) -> Result<LinkSummary, AppError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                COUNT(*)                                AS total,
                COUNT(*) FILTER (WHERE active)          AS active,
                COALESCE(SUM(visits), 0)::BIGINT        AS total_visits
            FROM links
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LinkSummary {
            total: row.total,
            active: row.active,
            inactive: row.total - row.active,
            total_visits: row.total_visits,
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
