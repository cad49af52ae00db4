//! Key-value store implementation of the account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::keys;
use crate::domain::entities::{Account, CreateOutcome};
use crate::domain::repositories::AccountRepository;
use crate::domain::store::{KeyValueStore, StoreError};
use crate::error::AppError;

pub struct KvAccountRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvAccountRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountRepository for KvAccountRepository {
    async fn create(&self, account: &Account) -> Result<CreateOutcome, AppError> {
        let fields = [
            ("password_hash".to_string(), account.password_hash.clone()),
            ("created_at".to_string(), account.created_at.to_rfc3339()),
        ];

        let created = self
            .store
            .hash_set_if_absent(&keys::account(&account.username), &fields, None)
            .await?;

        Ok(if created {
            CreateOutcome::Created
        } else {
            CreateOutcome::AlreadyExists
        })
    }

    async fn find(&self, username: &str) -> Result<Option<Account>, AppError> {
        let key = keys::account(username);
        let Some(mut fields) = self.store.hash_get_all(&key).await? else {
            return Ok(None);
        };

        let corrupt = |reason: String| StoreError::Corrupt {
            key: key.clone(),
            reason,
        };

        let password_hash = fields
            .remove("password_hash")
            .ok_or_else(|| corrupt("missing password_hash".to_string()))?;
        let created_at = fields
            .get("created_at")
            .map(|raw| DateTime::parse_from_rfc3339(raw))
            .transpose()
            .map_err(|e| corrupt(format!("created_at: {}", e)))?
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Ok(Some(Account {
            username: username.to_string(),
            password_hash,
            created_at,
        }))
    }
}
