//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`memory`] - In-process repository implementations
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod memory;
pub mod persistence;

use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{
    AdminRepository, LinkRepository, SettingsRepository, TokenRepository,
};

/// One storage backend's complete set of repositories.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            links: Arc::new(persistence::PgLinkRepository::new(pool.clone())),
            admins: Arc::new(persistence::PgAdminRepository::new(pool.clone())),
            tokens: Arc::new(persistence::PgTokenRepository::new(pool.clone())),
            settings: Arc::new(persistence::PgSettingsRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        let admins = memory::MemoryAdminRepository::new();
        let tokens = admins.tokens();

        Self {
            links: Arc::new(memory::MemoryLinkRepository::new()),
            admins: Arc::new(admins),
            tokens: Arc::new(tokens),
            settings: Arc::new(memory::MemorySettingsRepository::new()),
        }
    }
}
