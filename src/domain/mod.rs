//! Domain layer containing business entities and repository contracts.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers; repository traits define the contracts implemented by
//! [`crate::infrastructure`].
//!
//! # Modules
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`visit_event`] - Visit accounting event model
//!
//! # Visit Accounting Flow
//!
//! 1. HTTP handler resolves a slug via [`crate::application::services::LinkResolver`]
//! 2. On `Found`, a [`visit_event::VisitEvent`] is sent to a bounded channel
//! 3. [`crate::application::visit_worker::run_visit_worker`] applies the
//!    increment with retry
//! 4. The counter is bumped atomically by [`repositories::LinkRepository::increment_visits`]

pub mod entities;
pub mod repositories;
pub mod visit_event;
