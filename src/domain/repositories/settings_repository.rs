//! Repository trait for site settings.

use crate::domain::entities::SiteSettings;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Loads the saved settings, `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<SiteSettings>, AppError>;

    /// Replaces the saved settings.
    async fn save(&self, settings: &SiteSettings) -> Result<(), AppError>;
}
