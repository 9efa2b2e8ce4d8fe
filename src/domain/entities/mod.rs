//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures; validation and authorization live in
//! the application services.
//!
//! # Entity Types
//!
//! - [`Link`] - A slug mapped to a target URL
//! - [`Admin`] - An account allowed to call the admin API
//! - [`SiteSettings`] - Site-wide read-only parameters
//!
//! Creation and partial updates use separate structs (`NewLink`, `LinkPatch`,
//! `NewAdmin`, `SettingsPatch`).

pub mod admin;
pub mod link;
pub mod page;
pub mod settings;

pub use admin::{Admin, AdminFilter, Identity, NewAdmin, Role};
pub use link::{
    Link, LinkFilter, LinkMetadata, LinkPatch, LinkSort, LinkSummary, NewLink, Resolution,
    ResolvedLink,
};
pub use page::Paginated;
pub use settings::{SettingsPatch, SiteSettings};
