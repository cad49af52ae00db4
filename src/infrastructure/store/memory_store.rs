//! In-process [`KeyValueStore`] for tests and single-node development runs.

use crate::domain::store::{FieldGuard, KeyValueStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Hash(_) => "hash",
            Self::Set(_) => "set",
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

fn wrong_type(key: &str, found: &Value, wanted: &str) -> StoreError {
    StoreError::Operation(format!(
        "WRONGTYPE key '{}' holds a {}, expected {}",
        key,
        found.kind(),
        wanted
    ))
}

/// Sharded in-memory store.
///
/// Single-key mutations go through the `DashMap` entry API, which holds the
/// shard lock for the duration of the closure. Guarded writes span two keys,
/// so they hold `guarded` exclusively while every other mutation holds it
/// shared. Expiry is applied lazily on access.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Slot>,
    guarded: RwLock<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        debug!("Using MemoryStore (data is not persisted)");
        Self::default()
    }

    /// Returns a clone of the live value at `key`, evicting it if expired.
    fn live_value(&self, key: &str) -> Option<Value> {
        let now = Utc::now();
        if let Some(slot) = self.entries.get(key) {
            if slot.is_live(now) {
                return Some(slot.value.clone());
            }
        } else {
            return None;
        }
        self.entries.remove_if(key, |_, slot| !slot.is_live(now));
        None
    }

    /// Runs `f` on the live slot at `key`, creating it with `init` if absent
    /// or expired.
    fn upsert<T>(
        &self,
        key: &str,
        init: impl FnOnce() -> Value,
        f: impl FnOnce(&mut Slot) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let now = Utc::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_live(now) {
                    occupied.insert(Slot::new(init()));
                }
                f(occupied.get_mut())
            }
            Entry::Vacant(vacant) => {
                let mut slot = vacant.insert(Slot::new(init()));
                f(slot.value_mut())
            }
        }
    }

    fn incr(&self, key: &str, delta: i64) -> StoreResult<i64> {
        self.upsert(
            key,
            || Value::Text("0".to_string()),
            |slot| match &mut slot.value {
                Value::Text(text) => {
                    let current: i64 = text.parse().map_err(|_| {
                        StoreError::Operation(format!("value at '{}' is not an integer", key))
                    })?;
                    let next = current.checked_add(delta).ok_or_else(|| {
                        StoreError::Operation(format!("increment at '{}' would overflow", key))
                    })?;
                    *text = next.to_string();
                    Ok(next)
                }
                other => Err(wrong_type(key, other, "string")),
            },
        )
    }

    fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.upsert(
            key,
            || Value::Set(HashSet::new()),
            |slot| match &mut slot.value {
                Value::Set(set) => Ok(set.insert(member.to_string())),
                other => Err(wrong_type(key, other, "set")),
            },
        )
    }

    /// Expiry of the guard hash if the guard holds, `None` if it does not.
    fn check_guard(&self, guard: &FieldGuard) -> StoreResult<Option<GuardHeld>> {
        let Some(slot) = self.entries.get(&guard.key) else {
            return Ok(None);
        };
        if !slot.is_live(Utc::now()) {
            return Ok(None);
        }

        match &slot.value {
            Value::Hash(map) => Ok((map.get(&guard.field) == Some(&guard.value)).then_some(
                GuardHeld {
                    expires_at: slot.expires_at,
                },
            )),
            other => Err(wrong_type(&guard.key, other, "hash")),
        }
    }

    fn inherit_expiry(&self, key: &str, held: GuardHeld) {
        if let Some(at) = held.expires_at
            && let Some(mut slot) = self.entries.get_mut(key)
        {
            slot.expires_at = Some(at);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GuardHeld {
    expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn hash_set_if_absent(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        let _shared = self.guarded.read().await;
        let now = Utc::now();
        let slot = Slot {
            value: Value::Hash(fields.iter().cloned().collect()),
            expires_at: ttl.and_then(|d| chrono::Duration::from_std(d).ok().map(|d| now + d)),
        };

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return Ok(false);
                }
                occupied.insert(slot);
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(true)
            }
        }
    }

    async fn hash_update_if_present(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> StoreResult<bool> {
        let _shared = self.guarded.read().await;
        let now = Utc::now();
        let Some(mut slot) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        if !slot.is_live(now) {
            return Ok(false);
        }

        match &mut slot.value {
            Value::Hash(map) => {
                for (field, value) in fields {
                    map.insert(field.clone(), value.clone());
                }
                Ok(true)
            }
            other => Err(wrong_type(key, other, "hash")),
        }
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>> {
        match self.live_value(key) {
            None => Ok(None),
            Some(Value::Hash(map)) => Ok(Some(map)),
            Some(other) => Err(wrong_type(key, &other, "hash")),
        }
    }

    async fn increment_guarded(
        &self,
        guard: &FieldGuard,
        key: &str,
        delta: i64,
    ) -> StoreResult<Option<i64>> {
        let _exclusive = self.guarded.write().await;
        let Some(held) = self.check_guard(guard)? else {
            return Ok(None);
        };

        let next = self.incr(key, delta)?;
        self.inherit_expiry(key, held);
        Ok(Some(next))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.live_value(key) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text)),
            Some(other) => Err(wrong_type(key, &other, "string")),
        }
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let _shared = self.guarded.read().await;
        self.sadd(key, member)
    }

    async fn set_add_guarded(
        &self,
        guard: &FieldGuard,
        key: &str,
        member: &str,
    ) -> StoreResult<Option<bool>> {
        let _exclusive = self.guarded.write().await;
        let Some(held) = self.check_guard(guard)? else {
            return Ok(None);
        };

        let added = self.sadd(key, member)?;
        self.inherit_expiry(key, held);
        Ok(Some(added))
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let _shared = self.guarded.read().await;
        let now = Utc::now();
        let Some(mut slot) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        if !slot.is_live(now) {
            return Ok(false);
        }

        match &mut slot.value {
            Value::Set(set) => Ok(set.remove(member)),
            other => Err(wrong_type(key, other, "set")),
        }
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        match self.live_value(key) {
            None => Ok(Vec::new()),
            Some(Value::Set(set)) => Ok(set.into_iter().collect()),
            Some(other) => Err(wrong_type(key, &other, "set")),
        }
    }

    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let _shared = self.guarded.read().await;
        let now = Utc::now();
        let Some(mut slot) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        if !slot.is_live(now) {
            return Ok(false);
        }

        slot.expires_at = Some(at);
        Ok(true)
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        let _shared = self.guarded.read().await;
        let now = Utc::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, slot)| slot.is_live(now))
            .count();
        Ok(removed as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
