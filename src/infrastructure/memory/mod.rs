//! In-process repository implementations.
//!
//! Used with `STORAGE_BACKEND=memory` and by the integration tests. Data lives
//! for the lifetime of the process.

pub mod account_store;
pub mod link_store;
pub mod settings_store;

pub use account_store::{MemoryAdminRepository, MemoryTokenRepository};
pub use link_store::MemoryLinkRepository;
pub use settings_store::MemorySettingsRepository;
