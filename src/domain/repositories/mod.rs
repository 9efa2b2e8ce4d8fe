//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented by the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - PostgreSQL implementations live in `crate::infrastructure::persistence`
//! - In-process implementations live in `crate::infrastructure::memory`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link storage, lookup and visit counters
//! - [`AdminRepository`] - Account management
//! - [`TokenRepository`] - API token authentication
//! - [`SettingsRepository`] - Site settings

pub mod admin_repository;
pub mod link_repository;
pub mod settings_repository;
pub mod token_repository;

pub use admin_repository::AdminRepository;
pub use link_repository::LinkRepository;
pub use settings_repository::SettingsRepository;
pub use token_repository::{ApiToken, TokenRepository};

#[cfg(test)]
pub use admin_repository::MockAdminRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use settings_repository::MockSettingsRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
