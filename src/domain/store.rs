//! Backing store capability.
//!
//! The core depends only on the atomic primitives listed here, never on a
//! particular store's wire protocol. Every method is a potentially blocking
//! round trip; dropping the returned future must never leave a partially
//! applied write behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Errors raised by a [`KeyValueStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store operation error: {0}")]
    Operation(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed value at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Precondition of a guarded write: the hash at `key` is live and its
/// `field` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGuard {
    pub key: String,
    pub field: String,
    pub value: String,
}

/// Atomic key-value primitives backing records, counters and sets.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisStore`] - Redis, conditional writes via Lua
/// - [`crate::infrastructure::store::MemoryStore`] - in-process, for tests and local runs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Writes every field of a hash only if `key` does not exist.
    ///
    /// Existence check, field writes and the optional TTL are applied as one
    /// atomic operation: concurrent callers racing on the same key see exactly
    /// one `true`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the hash was created
    /// - `Ok(false)` if `key` already held a live value
    async fn hash_set_if_absent(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> StoreResult<bool>;

    /// Overwrites the given fields only if the hash at `key` exists.
    ///
    /// Never creates a new hash, so an expired record cannot be resurrected
    /// as a partial one.
    async fn hash_update_if_present(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> StoreResult<bool>;

    /// Reads all fields of a hash. `None` if the key is absent or expired.
    async fn hash_get_all(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>>;

    /// Adds `delta` to the integer at `key` (created at zero) while `guard`
    /// holds, and gives `key` the guard hash's expiry.
    ///
    /// Guard check, increment and expiry copy are one atomic step.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` with the new value
    /// - `Ok(None)` if the guard does not hold; nothing is written
    async fn increment_guarded(
        &self,
        guard: &FieldGuard,
        key: &str,
        delta: i64,
    ) -> StoreResult<Option<i64>>;

    /// Plain read of a string value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Adds `member` to the set at `key`. Returns `true` if it was not present.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Adds `member` to the set at `key` while `guard` holds, with the same
    /// atomicity and expiry copy as [`Self::increment_guarded`].
    ///
    /// `Ok(None)` if the guard does not hold, otherwise whether `member` was new.
    async fn set_add_guarded(
        &self,
        guard: &FieldGuard,
        key: &str,
        member: &str,
    ) -> StoreResult<Option<bool>>;

    /// Removes `member` from the set at `key`. Returns `true` if it was present.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Lists members of the set at `key` (empty if absent).
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Sets an absolute expiry deadline. Returns `false` if the key is absent.
    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Deletes the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> StoreResult<u64>;

    /// Round-trip health probe.
    async fn ping(&self) -> StoreResult<()>;
}
