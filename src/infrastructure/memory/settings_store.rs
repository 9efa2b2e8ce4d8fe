//! In-process site settings.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::SiteSettings;
use crate::domain::repositories::SettingsRepository;
use crate::error::AppError;

#[derive(Default)]
pub struct MemorySettingsRepository {
    saved: RwLock<Option<SiteSettings>>,
}

impl MemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepository {
    async fn load(&self) -> Result<Option<SiteSettings>, AppError> {
        Ok(self.saved.read().await.clone())
    }

    async fn save(&self, settings: &SiteSettings) -> Result<(), AppError> {
        *self.saved.write().await = Some(settings.clone());
        Ok(())
    }
}
