//! Visit event model for asynchronous visit accounting.

use chrono::{DateTime, Utc};

/// A successful resolution waiting to be counted.
///
/// Created by the redirect handler after a `Found` resolution and sent to the
/// visit worker over a bounded channel, so the redirect never waits on the
/// counter update.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvent {
    pub link_id: i64,
    pub slug: String,
    pub occurred_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(link_id: i64, slug: impl Into<String>) -> Self {
        Self {
            link_id,
            slug: slug.into(),
            occurred_at: Utc::now(),
        }
    }
}
