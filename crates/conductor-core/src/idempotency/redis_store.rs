//! Redis-backed idempotency store
//!
//! Reservations are `SET key <marker> NX EX <reservation_ttl>` so a crashed
//! engine cannot hold a key forever. Results replace the marker.
//!
//! Keys under the prefix:
//! - `result:<idempotency key>`: reservation marker or stored result
//! - `task:<task id>`: idempotency key of an accepted task
//! - `pending:<task id>`: serialized pending approval, taken with `GETDEL`

use super::IdempotencyStore;
use crate::engine::AgentResult;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Value held by a reserved, not yet stored, key
const RESERVED_MARKER: &str = "__conductor_reserved__";

/// Shared store for multi-instance deployments
pub struct RedisIdempotencyStore {
    client: redis::Client,
    /// Key prefix isolating engine keys from other Redis data
    prefix: String,
    /// Result TTL in seconds, 0 keeps results forever
    result_ttl_secs: u64,
    /// Reservation TTL in seconds
    reservation_ttl_secs: u64,
}

impl RedisIdempotencyStore {
    /// Create a store with default prefix and TTLs
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self> {
        Self::with_options(redis_url, "conductor:idem:", 0)
    }

    /// Create with custom prefix and result TTL
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn with_options(redis_url: &str, prefix: &str, result_ttl_secs: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::Store(e.to_string()))?;

        Ok(Self {
            client,
            prefix: prefix.to_string(),
            result_ttl_secs,
            reservation_ttl_secs: 600,
        })
    }

    /// Set how long an unfinished reservation survives
    #[must_use]
    pub fn with_reservation_ttl_secs(mut self, secs: u64) -> Self {
        self.reservation_ttl_secs = secs.max(1);
        self
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}result:{}", self.prefix, key)
    }

    fn task_index_key(&self, task_id: Uuid) -> String {
        format!("{}task:{}", self.prefix, task_id)
    }

    fn pending_key(&self, task_id: Uuid) -> String {
        format!("{}pending:{}", self.prefix, task_id)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Store(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn try_reserve(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        let reply: Option<String> = redis::cmd("SET")
            .arg(self.build_key(key))
            .arg(RESERVED_MARKER)
            .arg("NX")
            .arg("EX")
            .arg(self.reservation_ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis SET NX failed: {}", e)))?;

        let reserved = reply.is_some();
        debug!(key = %key, reserved, "Reservation attempted in Redis");
        Ok(reserved)
    }

    async fn get(&self, key: &str) -> Result<Option<AgentResult>> {
        let mut conn = self.get_connection().await?;

        let data: Option<String> = redis::cmd("GET")
            .arg(self.build_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis GET failed: {}", e)))?;

        match data {
            Some(json) if json != RESERVED_MARKER => {
                let result = serde_json::from_str(&json)
                    .map_err(|e| Error::Store(format!("Failed to deserialize result: {}", e)))?;
                Ok(Some(result))
            }
            _ => Ok(None),
        }
    }

    async fn put(&self, key: &str, result: &AgentResult) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(result)?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.build_key(key)).arg(&json);
        if self.result_ttl_secs > 0 {
            cmd.arg("EX").arg(self.result_ttl_secs);
        }
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis SET failed: {}", e)))?;

        debug!(key = %key, ttl = self.result_ttl_secs, "Result stored in Redis");
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        let deleted: i64 = redis::cmd("DEL")
            .arg(self.build_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis DEL failed: {}", e)))?;

        debug!(key = %key, deleted = deleted > 0, "Key released in Redis");
        Ok(())
    }

    async fn index_task(&self, task_id: Uuid, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(self.task_index_key(task_id)).arg(key);
        if self.result_ttl_secs > 0 {
            cmd.arg("EX").arg(self.result_ttl_secs);
        }
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis SET failed: {}", e)))
    }

    async fn task_key(&self, task_id: Uuid) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;

        let key: Option<String> = redis::cmd("GET")
            .arg(self.task_index_key(task_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis GET failed: {}", e)))?;
        let Some(key) = key else {
            return Ok(None);
        };

        // The index outlives a released key; only report keys still held
        let held: bool = redis::cmd("EXISTS")
            .arg(self.build_key(&key))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis EXISTS failed: {}", e)))?;
        Ok(held.then_some(key))
    }

    async fn put_pending(&self, task_id: Uuid, record: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SET")
            .arg(self.pending_key(task_id))
            .arg(record)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis SET failed: {}", e)))?;

        debug!(task_id = %task_id, "Pending approval stored in Redis");
        Ok(())
    }

    async fn take_pending(&self, task_id: Uuid) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;

        redis::cmd("GETDEL")
            .arg(self.pending_key(task_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Store(format!("Redis GETDEL failed: {}", e)))
    }

    async fn list_pending(&self) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let pattern = format!("{}pending:*", self.prefix);

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::Store(format!("Redis SCAN failed: {}", e)))?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            // Taken between SCAN and GET
            let record: Option<String> = redis::cmd("GET")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(|e| Error::Store(format!("Redis GET failed: {}", e)))?;
            records.extend(record);
        }
        Ok(records)
    }

    fn name(&self) -> &str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            RedisIdempotencyStore::new("not-a-redis-url"),
            Err(Error::Store(_))
        ));
    }

    #[test]
    fn test_key_prefix() {
        let store =
            RedisIdempotencyStore::with_options("redis://127.0.0.1:6379", "test:", 60).unwrap();
        assert_eq!(store.build_key("abc"), "test:result:abc");
        let task_id = uuid::Uuid::nil();
        assert_eq!(
            store.pending_key(task_id),
            format!("test:pending:{}", task_id)
        );
    }

    // Run with: cargo test --features redis-tests
    #[cfg(feature = "redis-tests")]
    mod live {
        use super::*;
        use crate::engine::{Provenance, TaskStatus};

        #[tokio::test]
        async fn test_redis_roundtrip() {
            let store = RedisIdempotencyStore::with_options(
                "redis://127.0.0.1:6379",
                "conductor:test:",
                60,
            )
            .unwrap();
            let key = uuid::Uuid::new_v4().to_string();

            assert!(store.try_reserve(&key).await.unwrap());
            assert!(!store.try_reserve(&key).await.unwrap());
            assert!(store.get(&key).await.unwrap().is_none());

            let result = AgentResult {
                task_id: uuid::Uuid::new_v4(),
                idempotency_key: key.clone(),
                status: TaskStatus::Failed,
                result: None,
                artifacts: vec![],
                provenance: Provenance::default(),
                created_at: chrono::Utc::now(),
            };
            store.put(&key, &result).await.unwrap();
            assert_eq!(store.get(&key).await.unwrap(), Some(result));

            store.release(&key).await.unwrap();
            assert!(store.try_reserve(&key).await.unwrap());
            store.release(&key).await.unwrap();
        }

        #[tokio::test]
        async fn test_redis_pending_taken_once() {
            let store = RedisIdempotencyStore::with_options(
                "redis://127.0.0.1:6379",
                "conductor:test:",
                60,
            )
            .unwrap();
            let task_id = uuid::Uuid::new_v4();

            store.put_pending(task_id, "{}").await.unwrap();
            assert!(store.list_pending().await.unwrap().contains(&"{}".to_string()));
            assert_eq!(store.take_pending(task_id).await.unwrap().as_deref(), Some("{}"));
            assert!(store.take_pending(task_id).await.unwrap().is_none());
        }
    }
}
