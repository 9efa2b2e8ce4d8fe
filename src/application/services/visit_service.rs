//! Visit accounting.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::deadline::bounded;

/// Adds one visit to a link's counter per call.
pub struct VisitAccountant {
    links: Arc<dyn LinkRepository>,
    storage_timeout: Duration,
}

impl VisitAccountant {
    pub fn new(links: Arc<dyn LinkRepository>, storage_timeout: Duration) -> Self {
        Self {
            links,
            storage_timeout,
        }
    }

    /// Performs exactly one atomic increment.
    ///
    /// Returns `Ok(false)` if the link was deleted before the visit was counted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] on timeout. A timed out increment may
    /// still have been applied.
    pub async fn record_visit(&self, link_id: i64) -> Result<bool, AppError> {
        bounded(self.storage_timeout, self.links.increment_visits(link_id)).await
    }
}
