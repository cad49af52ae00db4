//! Repository trait for per-key visit analytics.

use crate::domain::entities::ClickStats;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Counter and visitor-set operations backing [`ClickStats`].
///
/// Writes are scoped to one record generation, identified by the record's
/// `created_at`. A write for a generation that was deleted, expired or
/// replaced is skipped and reported as `None`, so stats never outlive or
/// leak into a record. Each write is individually atomic; the two are not
/// linked to each other.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::KvStatsRepository`] - key-value store implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Increments the visit counter by one and returns the new value.
    async fn increment_visits(
        &self,
        short_key: &str,
        generation: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError>;

    /// Adds a visitor id to the deduplicated set. `Some(true)` if it was new.
    async fn add_visitor(
        &self,
        short_key: &str,
        generation: DateTime<Utc>,
        visitor_id: &str,
    ) -> Result<Option<bool>, AppError>;

    /// Reads the current stats; a never-visited key yields zero visits.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreUnavailable`] on store errors or a non-numeric counter.
    async fn get(&self, short_key: &str) -> Result<ClickStats, AppError>;
}
