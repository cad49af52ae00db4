//! Redis-backed [`KeyValueStore`].

use crate::domain::store::{FieldGuard, KeyValueStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, RedisError, RedisResult, Script, aio::ConnectionManager};
use std::collections::HashMap;
use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

/// Claims a hash only if the key is free. ARGV[1] is the TTL in milliseconds
/// (0 for none), the rest are field/value pairs.
static CREATE_IF_ABSENT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 1 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV, 2))
        local ttl = tonumber(ARGV[1])
        if ttl > 0 then
            redis.call('PEXPIRE', KEYS[1], ttl)
        end
        return 1
        ",
    )
});

/// Overwrites fields of an existing hash; never creates one.
static UPDATE_IF_PRESENT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HSET', KEYS[1], unpack(ARGV))
        return 1
        ",
    )
});

/// Increments KEYS[2] by ARGV[3] while hash KEYS[1] has field ARGV[1] equal
/// to ARGV[2], then copies the hash's TTL. Nil reply if the guard fails.
static INCR_GUARDED: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('HGET', KEYS[1], ARGV[1]) ~= ARGV[2] then
            return false
        end
        local value = redis.call('INCRBY', KEYS[2], ARGV[3])
        local ttl = redis.call('PTTL', KEYS[1])
        if ttl > 0 then
            redis.call('PEXPIRE', KEYS[2], ttl)
        end
        return value
        ",
    )
});

/// Same guard as [`INCR_GUARDED`], adding member ARGV[3] to set KEYS[2].
static SADD_GUARDED: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('HGET', KEYS[1], ARGV[1]) ~= ARGV[2] then
            return false
        end
        local added = redis.call('SADD', KEYS[2], ARGV[3])
        local ttl = redis.call('PTTL', KEYS[1])
        if ttl > 0 then
            redis.call('PEXPIRE', KEYS[2], ttl)
        end
        return added
        ",
    )
});

/// Redis store using a multiplexed `ConnectionManager`.
///
/// Conditional writes run as Lua scripts so existence check and writes are a
/// single server-side step. Each call is bounded by `op_timeout`; a timed-out
/// script either ran fully on the server or not at all.
pub struct RedisStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let store = Self {
            conn: manager,
            op_timeout,
        };
        store.ping().await?;

        info!("✓ Connected to Redis");

        Ok(store)
    }

    async fn timed<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => result.map_err(map_redis_error),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }
}

fn map_redis_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn hash_set_if_absent(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        let ttl_ms = ttl.map(|d| d.as_millis().max(1) as u64).unwrap_or(0);

        let mut invocation = CREATE_IF_ABSENT.key(key);
        invocation.arg(ttl_ms);
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }

        let mut conn = self.conn.clone();
        let created: i64 = self.timed(invocation.invoke_async(&mut conn)).await?;

        debug!(key, created = created == 1, "HSET if absent");
        Ok(created == 1)
    }

    async fn hash_update_if_present(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> StoreResult<bool> {
        let mut invocation = UPDATE_IF_PRESENT.key(key);
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }

        let mut conn = self.conn.clone();
        let updated: i64 = self.timed(invocation.invoke_async(&mut conn)).await?;
        Ok(updated == 1)
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = self.timed(conn.hgetall(key)).await?;

        Ok(if map.is_empty() { None } else { Some(map) })
    }

    async fn increment_guarded(
        &self,
        guard: &FieldGuard,
        key: &str,
        delta: i64,
    ) -> StoreResult<Option<i64>> {
        let mut invocation = INCR_GUARDED.key(&guard.key);
        invocation
            .key(key)
            .arg(&guard.field)
            .arg(&guard.value)
            .arg(delta);

        let mut conn = self.conn.clone();
        self.timed(invocation.invoke_async(&mut conn)).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        self.timed(conn.get(key)).await
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = self.timed(conn.sadd(key, member)).await?;
        Ok(added > 0)
    }

    async fn set_add_guarded(
        &self,
        guard: &FieldGuard,
        key: &str,
        member: &str,
    ) -> StoreResult<Option<bool>> {
        let mut invocation = SADD_GUARDED.key(&guard.key);
        invocation
            .key(key)
            .arg(&guard.field)
            .arg(&guard.value)
            .arg(member);

        let mut conn = self.conn.clone();
        let added: Option<i64> = self.timed(invocation.invoke_async(&mut conn)).await?;
        Ok(added.map(|n| n > 0))
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = self.timed(conn.srem(key, member)).await?;
        Ok(removed > 0)
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        self.timed(conn.smembers(key)).await
    }

    async fn expire_at(&self, key: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let applied: i64 = self
            .timed(conn.pexpire_at(key, at.timestamp_millis()))
            .await?;
        Ok(applied == 1)
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        self.timed(conn.del(keys)).await
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        self.timed(conn.ping::<()>()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Requires a running Redis at `REDIS_TEST_URL`.
    async fn connect() -> RedisStore {
        let url = std::env::var("REDIS_TEST_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/15".to_string());
        RedisStore::connect(&url, Duration::from_secs(2))
            .await
            .expect("Redis must be reachable for ignored tests")
    }

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_create_if_absent_is_exclusive() {
        let store = connect().await;
        let key = format!("test:url:{}", rand::random::<u32>());

        let first = store
            .hash_set_if_absent(&key, &fields(&[("original_url", "https://a.example")]), None)
            .await
            .unwrap();
        let second = store
            .hash_set_if_absent(&key, &fields(&[("original_url", "https://b.example")]), None)
            .await
            .unwrap();

        assert!(first);
        assert!(!second);

        let stored = store.hash_get_all(&key).await.unwrap().unwrap();
        assert_eq!(stored["original_url"], "https://a.example");

        store.delete(&[key]).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_update_if_present_does_not_create() {
        let store = connect().await;
        let key = format!("test:url:{}", rand::random::<u32>());

        let updated = store
            .hash_update_if_present(&key, &fields(&[("expires_at", "x")]))
            .await
            .unwrap();

        assert!(!updated);
        assert!(store.hash_get_all(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_guarded_counter_and_set() {
        let store = connect().await;
        let suffix = rand::random::<u32>();
        let record = format!("test:url:{}", suffix);
        let counter = format!("test:clicks:{}", suffix);
        let set = format!("test:visitors:{}", suffix);
        let guard = FieldGuard {
            key: record.clone(),
            field: "created_at".to_string(),
            value: "g1".to_string(),
        };

        assert_eq!(store.increment_guarded(&guard, &counter, 1).await.unwrap(), None);

        store
            .hash_set_if_absent(
                &record,
                &fields(&[("created_at", "g1")]),
                Some(Duration::from_secs(60)),
            )
            .await
            .unwrap();

        assert_eq!(store.increment_guarded(&guard, &counter, 1).await.unwrap(), Some(1));
        assert_eq!(store.increment_guarded(&guard, &counter, 1).await.unwrap(), Some(2));
        assert_eq!(store.get(&counter).await.unwrap().as_deref(), Some("2"));

        assert_eq!(store.set_add_guarded(&guard, &set, "1.1.1.1").await.unwrap(), Some(true));
        assert_eq!(store.set_add_guarded(&guard, &set, "1.1.1.1").await.unwrap(), Some(false));
        assert_eq!(store.set_members(&set).await.unwrap(), vec!["1.1.1.1"]);

        let mut conn = store.conn.clone();
        let ttl: i64 = conn.pttl(&counter).await.unwrap();
        assert!(ttl > 0);

        let stale = FieldGuard {
            value: "g0".to_string(),
            ..guard
        };
        assert_eq!(store.increment_guarded(&stale, &counter, 1).await.unwrap(), None);

        assert_eq!(store.delete(&[record, counter, set]).await.unwrap(), 3);
    }
}
