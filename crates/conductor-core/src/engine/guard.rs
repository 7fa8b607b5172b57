//! Cleanup for submissions abandoned mid-flight
//!
//! A submission future can be dropped at any await point, for example when an
//! HTTP client disconnects. The guard is armed while a task holds its
//! idempotency key without a stored outcome; dropping it armed releases the
//! key so a retry can run instead of waiting on a reservation nobody owns.

use crate::idempotency::IdempotencyStore;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use uuid::Uuid;

use super::core::Engine;

pub(crate) struct ReservationGuard {
    store: Arc<dyn IdempotencyStore>,
    active_tasks: Arc<DashMap<Uuid, CancellationToken>>,
    task_id: Uuid,
    key: String,
    armed: bool,
}

impl ReservationGuard {
    /// Track `task_id` as active under `cancel` until the guard drops
    pub(crate) fn new(
        engine: &Engine,
        task_id: Uuid,
        key: &str,
        cancel: CancellationToken,
    ) -> Self {
        engine.active_tasks.insert(task_id, cancel);
        Self {
            store: engine.store.clone(),
            active_tasks: engine.active_tasks.clone(),
            task_id,
            key: key.to_string(),
            armed: true,
        }
    }

    /// The task reached a stored, paused or released outcome
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        self.active_tasks.remove(&self.task_id);
        if !self.armed {
            return;
        }

        warn!(task_id = %self.task_id, key = %self.key, "Submission dropped before completion");
        let store = self.store.clone();
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.release(&key).await {
                        error!(key = %key, error = %e, "Failed to release abandoned key");
                    }
                });
            }
            Err(_) => error!(key = %key, "No runtime left to release abandoned key"),
        }
    }
}
