//! Utility functions shared across layers.
//!
//! - [`slug`] - Slug format rules and random slug generation
//! - [`validation`] - Field-level validation for URLs, metadata and emails
//! - [`deadline`] - Timeouts around storage calls
//! - [`db_error`] - PostgreSQL error classification

pub mod db_error;
pub mod deadline;
pub mod slug;
pub mod validation;
