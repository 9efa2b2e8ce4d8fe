//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and authorization. Services consume repository traits and provide
//! a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::LinkResolver`] - Slug to target resolution for redirects
//! - [`services::VisitAccountant`] - Atomic visit counting
//! - [`services::LinkService`] - Link registry (create, update, delete, list)
//! - [`services::AuthService`] - API token authentication
//! - [`services::AdminService`] - Account management
//! - [`services::SettingsService`] - Site settings
//!
//! [`visit_worker`] drains the visit queue in the background.

pub mod services;
pub mod visit_worker;
