//! Short key resolution with asynchronous visit recording.

use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::error;

use crate::domain::repositories::RecordRepository;
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;

/// Resolves short keys and hands each resolved visit to the visit queue.
///
/// Analytics never sit on the redirect path: the record lookup is the only
/// store round trip a caller waits for.
pub struct ResolutionService<R: RecordRepository> {
    repository: Arc<R>,
    visit_sender: mpsc::Sender<VisitEvent>,
}

impl<R: RecordRepository> ResolutionService<R> {
    pub fn new(repository: Arc<R>, visit_sender: mpsc::Sender<VisitEvent>) -> Self {
        Self {
            repository,
            visit_sender,
        }
    }

    /// Returns the original URL of a live record and schedules its visit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown or expired keys; no visit is
    /// recorded. Returns [`AppError::StoreUnavailable`] on store errors.
    pub async fn resolve(&self, short_key: &str, visitor_id: &str) -> Result<String, AppError> {
        let record = self.repository.find(short_key).await?.ok_or_else(|| {
            AppError::not_found("Short URL not found", json!({ "short_key": short_key }))
        })?;

        self.dispatch(VisitEvent::new(short_key, visitor_id, record.created_at));

        Ok(record.original_url)
    }

    /// Queues a visit without waiting. A full queue moves the send to a task
    /// so the visit is delayed rather than dropped.
    fn dispatch(&self, event: VisitEvent) {
        match self.visit_sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                metrics::counter!("shortkey_visits_dispatched_late_total").increment(1);
                let sender = self.visit_sender.clone();
                tokio::spawn(async move {
                    if let Err(e) = sender.send(event).await {
                        error!(short_key = %e.0.short_key, "Visit queue closed, visit dropped");
                    }
                });
            }
            Err(TrySendError::Closed(event)) => {
                error!(short_key = %event.short_key, "Visit queue closed, visit dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UrlRecord;
    use crate::domain::repositories::MockRecordRepository;
    use chrono::{Duration, Utc};

    fn record(expires_at: Option<chrono::DateTime<Utc>>) -> UrlRecord {
        UrlRecord {
            short_key: "abc123".to_string(),
            original_url: "https://example.com/a".to_string(),
            creator: None,
            created_at: Utc::now() - Duration::minutes(5),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_resolve_returns_url_and_queues_visit() {
        let mut mock_repo = MockRecordRepository::new();
        let stored = record(Some(Utc::now() + Duration::hours(1)));
        let created_at = stored.created_at;
        mock_repo
            .expect_find()
            .withf(|key| key == "abc123")
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));

        let (tx, mut rx) = mpsc::channel(8);
        let service = ResolutionService::new(Arc::new(mock_repo), tx);

        let url = service.resolve("abc123", "10.0.0.1").await.unwrap();

        assert_eq!(url, "https://example.com/a");
        let event = rx.try_recv().unwrap();
        assert_eq!(event, VisitEvent::new("abc123", "10.0.0.1", created_at));
    }

    #[tokio::test]
    async fn test_unknown_key_records_nothing() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo.expect_find().times(1).returning(|_| Ok(None));

        let (tx, mut rx) = mpsc::channel(8);
        let service = ResolutionService::new(Arc::new(mock_repo), tx);

        let result = service.resolve("missing", "10.0.0.1").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_store_error_records_nothing() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Err(AppError::store_unavailable("down", json!({}))));

        let (tx, mut rx) = mpsc::channel(8);
        let service = ResolutionService::new(Arc::new(mock_repo), tx);

        let result = service.resolve("abc123", "10.0.0.1").await;

        assert!(matches!(result, Err(AppError::StoreUnavailable { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_delays_instead_of_dropping() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record(None))));

        let (tx, mut rx) = mpsc::channel(1);
        let service = ResolutionService::new(Arc::new(mock_repo), tx);

        service.resolve("abc123", "first").await.unwrap();
        service.resolve("abc123", "second").await.unwrap();

        assert_eq!(rx.recv().await.unwrap().visitor_id, "first");
        let late = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(late.visitor_id, "second");
    }

    #[tokio::test]
    async fn test_closed_queue_does_not_fail_redirect() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record(None))));

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let service = ResolutionService::new(Arc::new(mock_repo), tx);

        let url = service.resolve("abc123", "10.0.0.1").await.unwrap();
        assert_eq!(url, "https://example.com/a");
    }
}
