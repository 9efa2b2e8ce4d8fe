//! Shared application state injected into every handler.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::services::{
    AdminService, AuthService, LinkResolver, LinkService, SettingsService,
};
use crate::config::Config;
use crate::domain::entities::SiteSettings;
use crate::domain::repositories::LinkRepository;
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::Repositories;
use crate::infrastructure::cache::CacheService;

/// Services and channels shared across requests.
///
/// Cloning is cheap: every field is an `Arc` or a channel handle.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LinkResolver>,
    pub link_service: Arc<LinkService>,
    pub admin_service: Arc<AdminService>,
    pub auth_service: Arc<AuthService>,
    pub settings_service: Arc<SettingsService>,
    /// Used directly by the health check.
    pub links: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    pub visit_sender: mpsc::Sender<VisitEvent>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        cache: Arc<dyn CacheService>,
        visit_sender: mpsc::Sender<VisitEvent>,
        site_defaults: SiteSettings,
        signing_secret: String,
        storage_timeout: Duration,
    ) -> Self {
        let settings_service = Arc::new(SettingsService::new(
            repositories.settings,
            site_defaults,
            storage_timeout,
        ));

        let auth_service = Arc::new(AuthService::new(
            repositories.tokens,
            repositories.admins.clone(),
            signing_secret,
            storage_timeout,
        ));

        Self {
            resolver: Arc::new(LinkResolver::new(
                repositories.links.clone(),
                cache.clone(),
                storage_timeout,
            )),
            link_service: Arc::new(LinkService::new(
                repositories.links.clone(),
                cache.clone(),
                settings_service.clone(),
                storage_timeout,
            )),
            admin_service: Arc::new(AdminService::new(
                repositories.admins,
                auth_service.clone(),
                storage_timeout,
            )),
            auth_service,
            settings_service,
            links: repositories.links,
            cache,
            visit_sender,
        }
    }

    pub fn from_config(
        repositories: Repositories,
        cache: Arc<dyn CacheService>,
        visit_sender: mpsc::Sender<VisitEvent>,
        config: &Config,
    ) -> Self {
        Self::new(
            repositories,
            cache,
            visit_sender,
            config.site_defaults(),
            config.token_signing_secret.clone(),
            config.storage_timeout(),
        )
    }
}
