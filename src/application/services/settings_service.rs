//! Site settings with a read-through cache.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::entities::{Identity, SettingsPatch, SiteSettings};
use crate::domain::repositories::SettingsRepository;
use crate::error::AppError;
use crate::utils::deadline::bounded;
use crate::utils::validation::{FieldErrors, email_error};

pub const MAX_REDIRECT_DELAY_SECONDS: u32 = 60;

/// Owns the current [`SiteSettings`] value.
///
/// The first [`current`](Self::current) call loads from storage, falling back
/// to the configured defaults when nothing was saved. Later calls are served
/// from memory until an [`update`](Self::update) replaces the value.
pub struct SettingsService {
    repository: Arc<dyn SettingsRepository>,
    defaults: SiteSettings,
    cached: RwLock<Option<SiteSettings>>,
    storage_timeout: Duration,
}

impl SettingsService {
    pub fn new(
        repository: Arc<dyn SettingsRepository>,
        defaults: SiteSettings,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            defaults,
            cached: RwLock::new(None),
            storage_timeout,
        }
    }

    pub async fn current(&self) -> Result<SiteSettings, AppError> {
        if let Some(settings) = self.cached.read().await.as_ref() {
            return Ok(settings.clone());
        }

        let mut slot = self.cached.write().await;
        self.load_into(&mut slot).await
    }

    /// Returns the value in `slot`, loading it from storage when empty.
    async fn load_into(&self, slot: &mut Option<SiteSettings>) -> Result<SiteSettings, AppError> {
        if let Some(settings) = slot.as_ref() {
            return Ok(settings.clone());
        }

        let settings = bounded(self.storage_timeout, self.repository.load())
            .await?
            .unwrap_or_else(|| self.defaults.clone());
        *slot = Some(settings.clone());

        Ok(settings)
    }

    /// Applies a partial update. Super-admin only.
    ///
    /// Read, merge and save run under the cache write lock, so concurrent
    /// updates of different fields are all kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Forbidden`] for other callers and
    /// [`AppError::Validation`] when the merged settings are invalid.
    pub async fn update(
        &self,
        actor: &Identity,
        patch: SettingsPatch,
    ) -> Result<SiteSettings, AppError> {
        actor.require_super_admin()?;

        let mut slot = self.cached.write().await;
        let mut next = self.load_into(&mut slot).await?;
        next.apply(patch);
        validate_settings(&next)?;

        bounded(self.storage_timeout, self.repository.save(&next)).await?;
        *slot = Some(next.clone());
        drop(slot);

        info!(admin_id = actor.admin_id, "Site settings updated");
        Ok(next)
    }
}

fn validate_settings(settings: &SiteSettings) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();

    if settings.site_name.trim().is_empty() {
        errors.add("site_name", "Site name must not be empty");
    }

    errors.check("support_email", email_error(&settings.support_email));

    let domain = settings.base_domain.trim();
    if domain.is_empty() {
        errors.add("base_domain", "Base domain must not be empty");
    } else if domain.contains("://") {
        errors.add("base_domain", "Base domain must not include a scheme");
    } else if domain.chars().any(char::is_whitespace) {
        errors.add("base_domain", "Base domain must not contain whitespace");
    }

    if settings.redirect_delay_seconds > MAX_REDIRECT_DELAY_SECONDS {
        errors.add(
            "redirect_delay_seconds",
            format!("Redirect delay must be at most {MAX_REDIRECT_DELAY_SECONDS} seconds"),
        );
    }

    errors.into_result()
}
