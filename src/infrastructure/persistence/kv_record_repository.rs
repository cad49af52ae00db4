//! Key-value store implementation of the record repository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::keys::{self, CREATED_AT};
use crate::domain::entities::{CreateOutcome, UrlRecord};
use crate::domain::repositories::RecordRepository;
use crate::domain::store::{KeyValueStore, StoreError};
use crate::error::AppError;

const ORIGINAL_URL: &str = "original_url";
const CREATOR: &str = "creator";
const EXPIRES_AT: &str = "expires_at";

/// Records stored as one hash per short key.
///
/// Creation is a single `hash_set_if_absent`, so uniqueness is decided by the
/// store and never by an application lock.
pub struct KvRecordRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvRecordRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

fn to_fields(record: &UrlRecord) -> Vec<(String, String)> {
    let mut fields = vec![
        (ORIGINAL_URL.to_string(), record.original_url.clone()),
        (CREATED_AT.to_string(), record.created_at.to_rfc3339()),
    ];
    if let Some(creator) = &record.creator {
        fields.push((CREATOR.to_string(), creator.clone()));
    }
    if let Some(expires_at) = record.expires_at {
        fields.push((EXPIRES_AT.to_string(), expires_at.to_rfc3339()));
    }
    fields
}

fn parse_time(key: &str, field: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("{}: {}", field, e),
        })
}

fn from_fields(
    short_key: &str,
    mut fields: HashMap<String, String>,
) -> Result<UrlRecord, StoreError> {
    let key = keys::record(short_key);

    let original_url = fields.remove(ORIGINAL_URL).ok_or_else(|| StoreError::Corrupt {
        key: key.clone(),
        reason: format!("missing {}", ORIGINAL_URL),
    })?;
    let created_at = match fields.get(CREATED_AT) {
        Some(raw) => parse_time(&key, CREATED_AT, raw)?,
        None => {
            return Err(StoreError::Corrupt {
                key,
                reason: format!("missing {}", CREATED_AT),
            });
        }
    };
    let expires_at = fields
        .get(EXPIRES_AT)
        .map(|raw| parse_time(&key, EXPIRES_AT, raw))
        .transpose()?;

    Ok(UrlRecord {
        short_key: short_key.to_string(),
        original_url,
        creator: fields.remove(CREATOR).filter(|c| !c.is_empty()),
        created_at,
        expires_at,
    })
}

#[async_trait]
impl RecordRepository for KvRecordRepository {
    async fn create(&self, record: &UrlRecord) -> Result<CreateOutcome, AppError> {
        let ttl = record
            .expires_at
            .map(|at| (at - Utc::now()).to_std().unwrap_or(std::time::Duration::from_millis(1)));

        let created = self
            .store
            .hash_set_if_absent(&keys::record(&record.short_key), &to_fields(record), ttl)
            .await?;

        if !created {
            return Ok(CreateOutcome::AlreadyExists);
        }

        // Leftover analytics of an earlier record with the same key text.
        if let Err(e) = self.store.delete(&keys::companions(&record.short_key)).await {
            warn!(short_key = %record.short_key, error = %e, "Failed to reset stats of new record");
        }

        debug!(short_key = %record.short_key, "Record created");
        Ok(CreateOutcome::Created)
    }

    async fn find(&self, short_key: &str) -> Result<Option<UrlRecord>, AppError> {
        let Some(fields) = self.store.hash_get_all(&keys::record(short_key)).await? else {
            return Ok(None);
        };

        let record = from_fields(short_key, fields)?;
        if record.is_expired() {
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn expire(
        &self,
        short_key: &str,
        ttl: Duration,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        let at = Utc::now() + ttl;
        let record_key = keys::record(short_key);

        let updated = self
            .store
            .hash_update_if_present(&record_key, &[(EXPIRES_AT.to_string(), at.to_rfc3339())])
            .await?;
        if !updated {
            return Ok(None);
        }

        self.store.expire_at(&record_key, at).await?;
        for companion in keys::companions(short_key) {
            self.store.expire_at(&companion, at).await?;
        }

        debug!(short_key, expires_at = %at, "Record expiry set");
        Ok(Some(at))
    }

    async fn delete(&self, short_key: &str) -> Result<bool, AppError> {
        let removed = self.store.delete(&[keys::record(short_key)]).await?;
        self.store.delete(&keys::companions(short_key)).await?;
        Ok(removed > 0)
    }

    async fn index_for_owner(&self, owner: &str, short_key: &str) -> Result<(), AppError> {
        self.store
            .set_add(&keys::owner_index(owner), short_key)
            .await?;
        Ok(())
    }

    async fn unindex_for_owner(&self, owner: &str, short_key: &str) -> Result<(), AppError> {
        self.store
            .set_remove(&keys::owner_index(owner), short_key)
            .await?;
        Ok(())
    }

    async fn owned_keys(&self, owner: &str) -> Result<Vec<String>, AppError> {
        let mut owned = self.store.set_members(&keys::owner_index(owner)).await?;
        owned.sort_unstable();
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, KvRecordRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = KvRecordRepository::new(store.clone());
        (store, repo)
    }

    /// Writes `clicks` visits for the live record `rec`.
    async fn seed_clicks(store: &MemoryStore, rec: &UrlRecord, clicks: i64) {
        let guard = keys::generation_guard(&rec.short_key, rec.created_at);
        store
            .increment_guarded(&guard, &keys::clicks(&rec.short_key), clicks)
            .await
            .unwrap()
            .unwrap();
    }

    fn record(short_key: &str, expires_at: Option<DateTime<Utc>>) -> UrlRecord {
        UrlRecord {
            short_key: short_key.to_string(),
            original_url: "https://example.com/a".to_string(),
            creator: Some("alice".to_string()),
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let (_, repo) = setup();
        let rec = record("abc123", None);

        let outcome = repo.create(&rec).await.unwrap();
        let found = repo.find("abc123").await.unwrap().unwrap();

        assert_eq!(outcome, CreateOutcome::Created);
        assert_eq!(found.original_url, rec.original_url);
        assert_eq!(found.creator.as_deref(), Some("alice"));
        assert_eq!(found.created_at.timestamp(), rec.created_at.timestamp());
        assert!(found.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_create_existing_key_keeps_original() {
        let (_, repo) = setup();
        repo.create(&record("promo", None)).await.unwrap();

        let mut other = record("promo", None);
        other.original_url = "https://other.example/".to_string();
        let outcome = repo.create(&other).await.unwrap();

        assert_eq!(outcome, CreateOutcome::AlreadyExists);
        let found = repo.find("promo").await.unwrap().unwrap();
        assert_eq!(found.original_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let (_, repo) = setup();
        assert!(repo.find("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_corrupt_record_is_store_error() {
        let (store, repo) = setup();
        store
            .hash_set_if_absent(
                "url:broken",
                &[("created_at".to_string(), "yesterday".to_string())],
                None,
            )
            .await
            .unwrap();

        let result = repo.find("broken").await;
        assert!(matches!(result, Err(AppError::StoreUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_expire_applies_to_record_and_stats() {
        let (store, repo) = setup();
        let rec = record("abc123", None);
        repo.create(&rec).await.unwrap();
        seed_clicks(&store, &rec, 3).await;

        let at = repo
            .expire("abc123", Duration::seconds(-1))
            .await
            .unwrap();

        assert!(at.is_some());
        assert!(repo.find("abc123").await.unwrap().is_none());
        assert_eq!(store.get("clicks:abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expire_missing_record_does_not_resurrect() {
        let (store, repo) = setup();

        let at = repo.expire("ghost", Duration::hours(1)).await.unwrap();

        assert!(at.is_none());
        assert!(store.hash_get_all("url:ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_in_future_keeps_record_live() {
        let (_, repo) = setup();
        repo.create(&record("abc123", None)).await.unwrap();

        let at = repo
            .expire("abc123", Duration::hours(1))
            .await
            .unwrap()
            .unwrap();

        let found = repo.find("abc123").await.unwrap().unwrap();
        assert_eq!(found.expires_at.map(|t| t.timestamp()), Some(at.timestamp()));
    }

    #[tokio::test]
    async fn test_recreate_starts_with_empty_stats() {
        let (store, repo) = setup();
        let old = record("reused", None);
        repo.create(&old).await.unwrap();
        seed_clicks(&store, &old, 7).await;
        store.set_add("visitors:reused", "1.2.3.4").await.unwrap();
        // Record hash lost on its own, leaving the stats behind.
        store.delete(&[keys::record("reused")]).await.unwrap();

        let mut new = record("reused", None);
        new.created_at = old.created_at + Duration::seconds(1);
        repo.create(&new).await.unwrap();

        assert_eq!(store.get("clicks:reused").await.unwrap(), None);
        assert!(store.set_members("visitors:reused").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_purges_record_and_stats() {
        let (store, repo) = setup();
        let rec = record("abc123", None);
        repo.create(&rec).await.unwrap();
        seed_clicks(&store, &rec, 1).await;

        assert!(repo.delete("abc123").await.unwrap());
        assert!(!repo.delete("abc123").await.unwrap());
        assert!(repo.find("abc123").await.unwrap().is_none());
        assert_eq!(store.get("clicks:abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_owner_index() {
        let (_, repo) = setup();

        repo.index_for_owner("alice", "b").await.unwrap();
        repo.index_for_owner("alice", "a").await.unwrap();
        repo.index_for_owner("bob", "c").await.unwrap();

        assert_eq!(repo.owned_keys("alice").await.unwrap(), vec!["a", "b"]);

        repo.unindex_for_owner("alice", "a").await.unwrap();
        assert_eq!(repo.owned_keys("alice").await.unwrap(), vec!["b"]);
        assert!(repo.owned_keys("carol").await.unwrap().is_empty());
    }
}
