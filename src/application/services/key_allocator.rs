//! Unique short key reservation.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::entities::{CreateOutcome, NewUrlRecord, UrlRecord};
use crate::domain::repositories::RecordRepository;
use crate::error::AppError;
use crate::utils::key_codec::{KeyCodec, is_reserved, validate_custom_key};

/// Reserves a short key and writes the record in the same store operation.
///
/// Uniqueness is decided by the repository's atomic create-if-absent. The
/// allocator never checks-then-writes and never overwrites.
pub struct KeyAllocator<R: RecordRepository> {
    repository: Arc<R>,
    codec: KeyCodec,
    max_attempts: usize,
}

impl<R: RecordRepository> KeyAllocator<R> {
    pub fn new(repository: Arc<R>, codec: KeyCodec, max_attempts: usize) -> Self {
        Self {
            repository,
            codec,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocates a key for `draft` and persists the record.
    ///
    /// With `preferred_key`, exactly one create is attempted; a taken key is
    /// an error, never a fallback to a generated one. Without it, up to
    /// `max_attempts` fresh candidates are tried.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] if `preferred_key` is malformed or reserved
    /// - [`AppError::Conflict`] if `preferred_key` is already taken
    /// - [`AppError::CollisionExhausted`] if every generated candidate collided
    /// - [`AppError::StoreUnavailable`] on store errors
    pub async fn allocate(
        &self,
        draft: NewUrlRecord,
        preferred_key: Option<String>,
    ) -> Result<UrlRecord, AppError> {
        match preferred_key {
            Some(key) => self.claim_preferred(&draft, key).await,
            None => self.claim_generated(&draft).await,
        }
    }

    async fn claim_preferred(
        &self,
        draft: &NewUrlRecord,
        key: String,
    ) -> Result<UrlRecord, AppError> {
        validate_custom_key(&key)?;

        let record = draft.with_key(key, Utc::now());
        match self.repository.create(&record).await? {
            CreateOutcome::Created => {
                metrics::counter!("shortkey_links_created_total", "key" => "custom").increment(1);
                Ok(record)
            }
            CreateOutcome::AlreadyExists => Err(AppError::conflict(
                "Short key already taken",
                json!({ "slug": record.short_key }),
            )),
        }
    }

    async fn claim_generated(&self, draft: &NewUrlRecord) -> Result<UrlRecord, AppError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.codec.generate();
            if is_reserved(&candidate) {
                debug!(candidate = %candidate, "Skipping reserved candidate");
                continue;
            }

            let record = draft.with_key(candidate, Utc::now());
            match self.repository.create(&record).await? {
                CreateOutcome::Created => {
                    metrics::counter!("shortkey_links_created_total", "key" => "generated")
                        .increment(1);
                    return Ok(record);
                }
                CreateOutcome::AlreadyExists => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        short_key = %record.short_key,
                        "Short key collision"
                    );
                    metrics::counter!("shortkey_key_collisions_total").increment(1);
                }
            }
        }

        Err(AppError::collision_exhausted(
            "Could not allocate a unique short key, retry later",
            json!({ "attempts": self.max_attempts }),
        ))
    }
}
