//! Best-effort visit analytics.

use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::domain::entities::ClickStats;
use crate::domain::repositories::StatsRepository;
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;

const VISITOR_ADD_RETRIES: usize = 3;

/// Updates per-key counters and visitor sets.
///
/// The counter increment and the visitor set-add are independent atomic
/// operations. A failure in one never prevents the other, and neither is
/// surfaced to the caller.
pub struct AnalyticsTracker<S: StatsRepository> {
    repository: Arc<S>,
}

impl<S: StatsRepository> AnalyticsTracker<S> {
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    /// Records one visit against the record generation it resolved.
    ///
    /// The increment is attempted exactly once: a timed-out increment may
    /// have been applied, and repeating it would double count. The set-add is
    /// idempotent and retried with bounded exponential backoff. A visit whose
    /// record was deleted or re-created in the meantime is discarded.
    pub async fn record_visit(&self, event: &VisitEvent) {
        let short_key = event.short_key.as_str();
        let generation = event.record_created_at;

        match self.repository.increment_visits(short_key, generation).await {
            Ok(Some(count)) => {
                metrics::counter!("shortkey_visits_recorded_total").increment(1);
                debug!(short_key, count, "Visit counted");
            }
            Ok(None) => {
                debug!(short_key, "Record gone or replaced, visit discarded");
                metrics::counter!("shortkey_visits_discarded_total").increment(1);
                return;
            }
            Err(e) => {
                warn!(short_key, error = %e, "Failed to increment visit counter");
                metrics::counter!("shortkey_analytics_failures_total", "op" => "increment")
                    .increment(1);
            }
        }

        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_millis(200))
            .map(jitter)
            .take(VISITOR_ADD_RETRIES);

        let added = Retry::spawn(strategy, || {
            self.repository
                .add_visitor(short_key, generation, &event.visitor_id)
        })
        .await;

        if let Err(e) = added {
            warn!(short_key, error = %e, "Failed to record visitor");
            metrics::counter!("shortkey_analytics_failures_total", "op" => "add_visitor")
                .increment(1);
        }
    }

    /// Reads the current stats of a key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store errors.
    pub async fn stats(&self, short_key: &str) -> Result<ClickStats, AppError> {
        self.repository.get(short_key).await
    }
}
