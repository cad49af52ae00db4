//! Repository trait for URL records.

use crate::domain::entities::{CreateOutcome, UrlRecord};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Transactional access to URL records and the per-owner key index.
///
/// Holds no state between calls: every method is one or more store round trips.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::KvRecordRepository`] - key-value store implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Atomically creates the record if its short key is free.
    ///
    /// All fields (and the TTL derived from `expires_at`) become visible
    /// together; a reader never observes a partially written record.
    ///
    /// # Returns
    ///
    /// - `Ok(CreateOutcome::Created)` if the key was claimed
    /// - `Ok(CreateOutcome::AlreadyExists)` if a live record holds the key
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store errors.
    async fn create(&self, record: &UrlRecord) -> Result<CreateOutcome, AppError>;

    /// Finds a live record by short key. Expired records are reported as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store errors or unreadable records.
    async fn find(&self, short_key: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Applies a time-to-live to the record and its analytics.
    ///
    /// Returns the new expiry, or `None` if no live record exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store errors.
    async fn expire(
        &self,
        short_key: &str,
        ttl: Duration,
    ) -> Result<Option<DateTime<Utc>>, AppError>;

    /// Purges the record and its analytics. Returns `true` if the record existed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store errors.
    async fn delete(&self, short_key: &str) -> Result<bool, AppError>;

    /// Adds a short key to the owner's index.
    async fn index_for_owner(&self, owner: &str, short_key: &str) -> Result<(), AppError>;

    /// Removes a short key from the owner's index.
    async fn unindex_for_owner(&self, owner: &str, short_key: &str) -> Result<(), AppError>;

    /// Lists short keys in the owner's index, including ones whose record expired.
    async fn owned_keys(&self, owner: &str) -> Result<Vec<String>, AppError>;
}
