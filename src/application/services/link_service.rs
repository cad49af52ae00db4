//! Short link creation and management service.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::key_allocator::KeyAllocator;
use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::RecordRepository;
use crate::error::AppError;
use crate::utils::key_codec::KeyCodec;
use crate::utils::url_validator::validate_url;

/// Service for creating short links and managing them on behalf of owners.
pub struct LinkService<R: RecordRepository> {
    repository: Arc<R>,
    allocator: KeyAllocator<R>,
}

impl<R: RecordRepository> LinkService<R> {
    /// Creates a new link service.
    ///
    /// # Arguments
    ///
    /// - `repository` - record repository shared with resolution
    /// - `codec` - key candidate generator
    /// - `max_attempts` - generated key attempts before giving up
    pub fn new(repository: Arc<R>, codec: KeyCodec, max_attempts: usize) -> Self {
        Self {
            allocator: KeyAllocator::new(repository.clone(), codec, max_attempts),
            repository,
        }
    }

    /// Creates a short link.
    ///
    /// An empty `slug` is treated as absent. When `creator` is set the key is
    /// added to the creator's index; a failure there is logged and does not
    /// undo the creation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - URL is missing or invalid
    /// - Slug is invalid or reserved
    ///
    /// Returns [`AppError::Conflict`] if the slug is taken and
    /// [`AppError::CollisionExhausted`] if no generated key could be claimed.
    pub async fn create_short_link(
        &self,
        long_url: &str,
        slug: Option<String>,
        creator: Option<String>,
        ttl: Option<Duration>,
    ) -> Result<UrlRecord, AppError> {
        let original_url = validate_url(long_url)?;

        let draft = NewUrlRecord {
            original_url,
            creator,
            expires_at: ttl.map(|ttl| Utc::now() + ttl),
        };
        let slug = slug.filter(|s| !s.is_empty());

        let record = self.allocator.allocate(draft, slug).await?;

        if let Some(owner) = &record.creator
            && let Err(e) = self
                .repository
                .index_for_owner(owner, &record.short_key)
                .await
        {
            warn!(
                owner = %owner,
                short_key = %record.short_key,
                error = %e,
                "Failed to index record for owner"
            );
        }

        info!(short_key = %record.short_key, "Short link created");
        Ok(record)
    }

    /// Retrieves a live record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live record has this key.
    pub async fn get_record(&self, short_key: &str) -> Result<UrlRecord, AppError> {
        self.repository.find(short_key).await?.ok_or_else(|| {
            AppError::not_found("Short URL not found", json!({ "short_key": short_key }))
        })
    }

    /// Retrieves a record the principal owns.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown keys and
    /// [`AppError::Forbidden`] for records created by someone else or anonymously.
    pub async fn get_owned(&self, short_key: &str, principal: &str) -> Result<UrlRecord, AppError> {
        let record = self.get_record(short_key).await?;

        if !record.is_owned_by(principal) {
            return Err(AppError::forbidden(
                "Record belongs to another user",
                json!({ "short_key": short_key }),
            ));
        }

        Ok(record)
    }

    /// Lists the live records in the owner's index.
    ///
    /// Index entries whose record expired, or whose key now belongs to a
    /// different record, are skipped.
    pub async fn list_owned(&self, owner: &str) -> Result<Vec<UrlRecord>, AppError> {
        let keys = self.repository.owned_keys(owner).await?;
        let mut records = Vec::with_capacity(keys.len());

        for key in keys {
            match self.repository.find(&key).await? {
                Some(record) if record.is_owned_by(owner) => records.push(record),
                _ => debug!(owner, short_key = %key, "Skipping dangling index entry"),
            }
        }

        Ok(records)
    }

    /// Sets the time-to-live of an owned record and its stats.
    ///
    /// # Errors
    ///
    /// See [`Self::get_owned`]. Also returns [`AppError::NotFound`] if the
    /// record expired between the ownership check and the update.
    pub async fn expire(
        &self,
        short_key: &str,
        principal: &str,
        ttl: Duration,
    ) -> Result<DateTime<Utc>, AppError> {
        self.get_owned(short_key, principal).await?;

        self.repository
            .expire(short_key, ttl)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short URL not found", json!({ "short_key": short_key }))
            })
    }

    /// Deletes an owned record, its stats, and its owner index entry.
    ///
    /// # Errors
    ///
    /// See [`Self::get_owned`].
    pub async fn delete(&self, short_key: &str, principal: &str) -> Result<(), AppError> {
        self.get_owned(short_key, principal).await?;

        self.repository.delete(short_key).await?;

        if let Err(e) = self.repository.unindex_for_owner(principal, short_key).await {
            warn!(owner = principal, short_key, error = %e, "Failed to remove index entry");
        }

        info!(short_key, "Short link deleted");
        Ok(())
    }

    /// Constructs the full short URL from the public base URL and a key.
    pub fn get_short_url(&self, base_url: &str, short_key: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), short_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CreateOutcome;
    use crate::domain::repositories::MockRecordRepository;

    fn service(mock_repo: MockRecordRepository) -> LinkService<MockRecordRepository> {
        LinkService::new(Arc::new(mock_repo), KeyCodec::default(), 5)
    }

    fn record(short_key: &str, creator: Option<&str>) -> UrlRecord {
        UrlRecord {
            short_key: short_key.to_string(),
            original_url: "https://example.com/a".to_string(),
            creator: creator.map(str::to_string),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_anonymous_skips_owner_index() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_create()
            .times(1)
            .returning(|_| Ok(CreateOutcome::Created));
        mock_repo.expect_index_for_owner().times(0);

        let record = service(mock_repo)
            .create_short_link("https://example.com/a", None, None, None)
            .await
            .unwrap();

        assert_eq!(record.original_url, "https://example.com/a");
        assert!(record.creator.is_none());
        assert!(record.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_create_indexes_for_creator() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_create()
            .returning(|_| Ok(CreateOutcome::Created));
        mock_repo
            .expect_index_for_owner()
            .withf(|owner, key| owner == "alice" && key == "promo")
            .times(1)
            .returning(|_, _| Ok(()));

        let record = service(mock_repo)
            .create_short_link(
                "https://example.com/a",
                Some("promo".to_string()),
                Some("alice".to_string()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(record.short_key, "promo");
        assert_eq!(record.creator.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_owner_index_failure_keeps_record() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_create()
            .returning(|_| Ok(CreateOutcome::Created));
        mock_repo
            .expect_index_for_owner()
            .returning(|_, _| Err(AppError::store_unavailable("down", json!({}))));

        let result = service(mock_repo)
            .create_short_link("https://example.com/a", None, Some("alice".to_string()), None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_with_ttl_sets_expiry() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_create()
            .withf(|record| record.expires_at.is_some())
            .returning(|_| Ok(CreateOutcome::Created));

        let record = service(mock_repo)
            .create_short_link("https://example.com/a", None, None, Some(Duration::seconds(60)))
            .await
            .unwrap();

        let remaining = record.expires_at.unwrap() - Utc::now();
        assert!(remaining > Duration::seconds(50) && remaining <= Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_empty_url_creates_nothing() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo.expect_create().times(0);

        let result = service(mock_repo)
            .create_short_link("", None, None, None)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.to_string(), "Missing URL parameter");
    }

    #[tokio::test]
    async fn test_empty_slug_generates_key() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_create()
            .withf(|record| record.short_key.len() == 8)
            .returning(|_| Ok(CreateOutcome::Created));

        let result = service(mock_repo)
            .create_short_link("https://example.com/a", Some(String::new()), None, None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_owned_forbidden_for_other_user() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record("abc123", Some("alice")))));

        let result = service(mock_repo).get_owned("abc123", "bob").await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_get_owned_forbidden_for_anonymous_record() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record("abc123", None))));

        let result = service(mock_repo).get_owned("abc123", "alice").await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_get_record_not_found() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo.expect_find().returning(|_| Ok(None));

        let result = service(mock_repo).get_record("nope").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_owned_skips_dangling_entries() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_owned_keys()
            .returning(|_| Ok(vec!["expired".into(), "live".into(), "reused".into()]));
        mock_repo.expect_find().returning(|key| {
            Ok(match key {
                "live" => Some(record("live", Some("alice"))),
                "reused" => Some(record("reused", Some("bob"))),
                _ => None,
            })
        });

        let records = service(mock_repo).list_owned("alice").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].short_key, "live");
    }

    #[tokio::test]
    async fn test_expire_owned_record() {
        let at = Utc::now() + Duration::hours(1);
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record("abc123", Some("alice")))));
        mock_repo
            .expect_expire()
            .withf(|key, ttl| key == "abc123" && *ttl == Duration::hours(1))
            .times(1)
            .returning(move |_, _| Ok(Some(at)));

        let result = service(mock_repo)
            .expire("abc123", "alice", Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(result, at);
    }

    #[tokio::test]
    async fn test_delete_removes_index_entry() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record("abc123", Some("alice")))));
        mock_repo
            .expect_delete()
            .times(1)
            .returning(|_| Ok(true));
        mock_repo
            .expect_unindex_for_owner()
            .withf(|owner, key| owner == "alice" && key == "abc123")
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(service(mock_repo).delete("abc123", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_by_other_user_is_forbidden() {
        let mut mock_repo = MockRecordRepository::new();
        mock_repo
            .expect_find()
            .returning(|_| Ok(Some(record("abc123", Some("alice")))));
        mock_repo.expect_delete().times(0);

        let result = service(mock_repo).delete("abc123", "mallory").await;

        assert!(matches!(result, Err(AppError::Forbidden { .. })));
    }

    #[test]
    fn test_get_short_url() {
        let service = service(MockRecordRepository::new());

        assert_eq!(
            service.get_short_url("http://localhost:8080", "abc123"),
            "http://localhost:8080/abc123"
        );
        assert_eq!(
            service.get_short_url("https://s.example.com/", "abc123"),
            "https://s.example.com/abc123"
        );
    }
}
