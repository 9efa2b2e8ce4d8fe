//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` structs.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage, lookup and visit counters
//! - [`PgAdminRepository`] - Accounts with the last super-admin guard
//! - [`PgTokenRepository`] - API token storage and validation
//! - [`PgSettingsRepository`] - Singleton site settings row

pub mod pg_admin_repository;
pub mod pg_link_repository;
pub mod pg_settings_repository;
pub mod pg_token_repository;

pub use pg_admin_repository::PgAdminRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_settings_repository::PgSettingsRepository;
pub use pg_token_repository::PgTokenRepository;
