//! In-memory idempotency store

use super::IdempotencyStore;
use crate::engine::AgentResult;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Slot {
    Reserved,
    /// Serialized result; replays deserialize the same bytes
    Stored(String),
}

/// Single-process store backed by a `DashMap`
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    slots: DashMap<String, Slot>,
    tasks: DashMap<Uuid, String>,
    pending: DashMap<Uuid, String>,
}

impl MemoryIdempotencyStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON for a key
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        match self.slots.get(key).as_deref() {
            Some(Slot::Stored(json)) => Some(json.clone()),
            _ => None,
        }
    }

    /// Number of reserved or stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn try_reserve(&self, key: &str) -> Result<bool> {
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Reserved);
                debug!(key = %key, "Idempotency key reserved");
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<AgentResult>> {
        match self.raw(key) {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, result: &AgentResult) -> Result<()> {
        let json = serde_json::to_string(result)?;
        self.slots.insert(key.to_string(), Slot::Stored(json));
        debug!(key = %key, "Result stored");
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<()> {
        self.slots.remove(key);
        self.tasks.retain(|_, indexed| indexed != key);
        debug!(key = %key, "Idempotency key released");
        Ok(())
    }

    async fn index_task(&self, task_id: Uuid, key: &str) -> Result<()> {
        self.tasks.insert(task_id, key.to_string());
        Ok(())
    }

    async fn task_key(&self, task_id: Uuid) -> Result<Option<String>> {
        Ok(self.tasks.get(&task_id).map(|key| key.value().clone()))
    }

    async fn put_pending(&self, task_id: Uuid, record: &str) -> Result<()> {
        self.pending.insert(task_id, record.to_string());
        Ok(())
    }

    async fn take_pending(&self, task_id: Uuid) -> Result<Option<String>> {
        Ok(self.pending.remove(&task_id).map(|(_, record)| record))
    }

    async fn list_pending(&self) -> Result<Vec<String>> {
        Ok(self.pending.iter().map(|entry| entry.value().clone()).collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
