//! Background worker draining the visit queue.

use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::application::services::VisitAccountant;
use crate::domain::visit_event::VisitEvent;

/// Retries after the first failed increment.
const RETRIES: usize = 2;

/// Runs until every sender is dropped, then waits for in-flight increments.
///
/// At most `concurrency` increments run at once. A failed increment is retried
/// with exponential backoff; the final failure is logged and counted, never
/// propagated.
pub async fn run_visit_worker(
    mut rx: mpsc::Receiver<VisitEvent>,
    accountant: Arc<VisitAccountant>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    info!(concurrency, "Visit worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let accountant = Arc::clone(&accountant);

        in_flight.spawn(async move {
            account(&accountant, event).await;
            drop(permit);
        });

        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}

    info!("Visit worker stopped");
}

async fn account(accountant: &VisitAccountant, event: VisitEvent) {
    let strategy = ExponentialBackoff::from_millis(10)
        .map(jitter)
        .take(RETRIES);

    match Retry::spawn(strategy, || accountant.record_visit(event.link_id)).await {
        Ok(true) => {
            metrics::counter!("visits_recorded_total").increment(1);
        }
        Ok(false) => {
            debug!(link_id = event.link_id, slug = %event.slug, "Visit for deleted link skipped");
        }
        Err(e) => {
            metrics::counter!("visits_failed_total").increment(1);
            warn!(
                link_id = event.link_id,
                slug = %event.slug,
                occurred_at = %event.occurred_at,
                error = %e,
                "Failed to record visit"
            );
        }
    }
}
