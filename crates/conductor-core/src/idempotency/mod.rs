//! Idempotency store
//!
//! Maps a client idempotency key to the result computed for it. A key moves
//! through three states:
//!
//! ```text
//! absent --try_reserve--> reserved --put--> stored (--put--> stored)
//!             ^               |
//!             +----release----+----------------+
//! ```
//!
//! `try_reserve` is an atomic conditional insert: exactly one caller wins a
//! key. `get` only ever returns stored results, never the reservation.
//!
//! The store also holds the engine's cross-instance bookkeeping: which key
//! each task was accepted under, and serialized pending approvals. Both live
//! next to the results so any engine sharing the store can resolve them.
//!
//! - `MemoryIdempotencyStore`: single-process, for development and tests
//! - `RedisIdempotencyStore`: shared across engine instances

mod memory;
mod redis_store;

pub use memory::MemoryIdempotencyStore;
pub use redis_store::RedisIdempotencyStore;

use crate::engine::AgentResult;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Key-value store with atomic reservation
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Reserve `key`; `false` if it is already reserved or stored
    async fn try_reserve(&self, key: &str) -> Result<bool>;

    /// Stored result for `key`
    async fn get(&self, key: &str) -> Result<Option<AgentResult>>;

    /// Store (or replace) the result for `key`
    async fn put(&self, key: &str, result: &AgentResult) -> Result<()>;

    /// Forget `key` entirely, reservation or result, and the tasks indexed to it
    async fn release(&self, key: &str) -> Result<()>;

    /// Record the key a task was accepted under
    async fn index_task(&self, task_id: Uuid, key: &str) -> Result<()>;

    /// Key a task was accepted under, while the key is held
    async fn task_key(&self, task_id: Uuid) -> Result<Option<String>>;

    /// Store a serialized pending approval
    async fn put_pending(&self, task_id: Uuid, record: &str) -> Result<()>;

    /// Remove and return a pending approval; exactly one caller gets it
    async fn take_pending(&self, task_id: Uuid) -> Result<Option<String>>;

    /// Every serialized pending approval
    async fn list_pending(&self) -> Result<Vec<String>>;

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}
