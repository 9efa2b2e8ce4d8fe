//! PostgreSQL implementation of settings repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::SiteSettings;
use crate::domain::repositories::SettingsRepository;
use crate::error::AppError;

#[derive(Debug, FromRow)]
struct SettingsRow {
    site_name: String,
    support_email: String,
    base_domain: String,
    default_active: bool,
    redirect_delay_seconds: i32,
}

/// Settings live in a single row with `id = 1`.
pub struct PgSettingsRepository {
    pool: Arc<PgPool>,
}

impl PgSettingsRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn load(&self) -> Result<Option<SiteSettings>, AppError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT site_name, support_email, base_domain, default_active, redirect_delay_seconds
            FROM site_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| SiteSettings {
            site_name: r.site_name,
            support_email: r.support_email,
            base_domain: r.base_domain,
            default_active: r.default_active,
            redirect_delay_seconds: u32::try_from(r.redirect_delay_seconds).unwrap_or(0),
        }))
    }

    async fn save(&self, settings: &SiteSettings) -> Result<(), AppError> {
        let delay = i32::try_from(settings.redirect_delay_seconds).unwrap_or(i32::MAX);

        sqlx::query(
            r#"
            INSERT INTO site_settings
                (id, site_name, support_email, base_domain, default_active, redirect_delay_seconds, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, NOW())
            ON CONFLICT (id) DO UPDATE SET
                site_name              = EXCLUDED.site_name,
                support_email          = EXCLUDED.support_email,
                base_domain            = EXCLUDED.base_domain,
                default_active         = EXCLUDED.default_active,
                redirect_delay_seconds = EXCLUDED.redirect_delay_seconds,
                updated_at             = NOW()
            "#,
        )
        .bind(&settings.site_name)
        .bind(&settings.support_email)
        .bind(&settings.base_domain)
        .bind(settings.default_active)
        .bind(delay)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
