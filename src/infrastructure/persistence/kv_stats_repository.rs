//! Key-value store implementation of the stats repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::keys;
use crate::domain::entities::ClickStats;
use crate::domain::repositories::StatsRepository;
use crate::domain::store::{KeyValueStore, StoreError};
use crate::error::AppError;

/// Visit counter and visitor set stored as two independent entities, each
/// written only while the record generation they belong to is live.
pub struct KvStatsRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvStatsRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

fn counter_value(key: &str, raw: &str) -> Result<u64, StoreError> {
    raw.parse::<u64>().map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl StatsRepository for KvStatsRepository {
    async fn increment_visits(
        &self,
        short_key: &str,
        generation: DateTime<Utc>,
    ) -> Result<Option<u64>, AppError> {
        let key = keys::clicks(short_key);
        let guard = keys::generation_guard(short_key, generation);
        let Some(count) = self.store.increment_guarded(&guard, &key, 1).await? else {
            return Ok(None);
        };

        u64::try_from(count).map(Some).map_err(|_| {
            StoreError::Corrupt {
                key,
                reason: format!("negative counter {}", count),
            }
            .into()
        })
    }

    async fn add_visitor(
        &self,
        short_key: &str,
        generation: DateTime<Utc>,
        visitor_id: &str,
    ) -> Result<Option<bool>, AppError> {
        let guard = keys::generation_guard(short_key, generation);
        Ok(self
            .store
            .set_add_guarded(&guard, &keys::visitors(short_key), visitor_id)
            .await?)
    }

    async fn get(&self, short_key: &str) -> Result<ClickStats, AppError> {
        let counter_key = keys::clicks(short_key);
        let count = match self.store.get(&counter_key).await? {
            Some(raw) => counter_value(&counter_key, &raw)?,
            None => 0,
        };
        let visitors = self.store.set_members(&keys::visitors(short_key)).await?;

        Ok(ClickStats::new(short_key, count, visitors))
    }
}
