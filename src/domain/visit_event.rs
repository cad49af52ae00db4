//! Visit event model for asynchronous analytics.

use chrono::{DateTime, Utc};

/// One resolved visit, handed from the redirect path to the visit worker.
///
/// `record_created_at` pins the visit to the record generation that was
/// resolved. If the key is deleted or re-created before the worker gets to
/// the event, the visit is discarded instead of being counted elsewhere.
///
/// # Usage Flow
///
/// 1. Created by [`crate::application::services::ResolutionService`] after a successful lookup
/// 2. Sent to the visit queue (never blocks the redirect)
/// 3. Processed by [`crate::application::visit_worker::run_visit_worker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitEvent {
    pub short_key: String,
    pub visitor_id: String,
    pub record_created_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(
        short_key: impl Into<String>,
        visitor_id: impl Into<String>,
        record_created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            short_key: short_key.into(),
            visitor_id: visitor_id.into(),
            record_created_at,
        }
    }
}
