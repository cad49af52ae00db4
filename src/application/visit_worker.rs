//! Background consumer of the visit queue.

use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::application::services::AnalyticsTracker;
use crate::domain::repositories::StatsRepository;
use crate::domain::visit_event::VisitEvent;

/// Feeds queued visits to the tracker with at most `concurrency` in flight.
///
/// Returns once every sender is dropped and all received visits are
/// recorded, which is how shutdown drains the queue.
pub async fn run_visit_worker<S>(
    mut rx: mpsc::Receiver<VisitEvent>,
    tracker: Arc<AnalyticsTracker<S>>,
    concurrency: usize,
) where
    S: StatsRepository + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    info!(concurrency, "Visit worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let tracker = tracker.clone();

        in_flight.spawn(async move {
            tracker.record_visit(&event).await;
            drop(permit);
        });

        while in_flight.try_join_next().is_some() {}
    }

    debug!(pending = in_flight.len(), "Visit queue closed, draining");
    while in_flight.join_next().await.is_some() {}

    info!("Visit worker stopped");
}
