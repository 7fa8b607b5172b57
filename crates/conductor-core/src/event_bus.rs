//! EventBus - broadcast of engine progress events.
//!
//! Events carry ids and states only; full results are fetched through the
//! engine by task id.

use crate::engine::EngineState;
use conductor_skills::SkillId;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted while a task moves through the engine
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Task accepted after its key was reserved
    TaskReceived {
        /// Task identifier
        task_id: Uuid,
        /// Task type
        task_type: String,
    },
    /// A stored result was returned for a repeated key
    TaskReplayed {
        /// Task identifier of the stored result
        task_id: Uuid,
    },
    /// Task entered a state
    StageEntered {
        /// Task identifier
        task_id: Uuid,
        /// State entered
        state: EngineState,
    },
    /// An execution attempt returned
    AttemptFinished {
        /// Task identifier
        task_id: Uuid,
        /// Attempted skill
        skill_id: SkillId,
        /// 1-based attempt number
        attempt: usize,
        /// Whether the attempt succeeded
        success: bool,
        /// Attempt duration in milliseconds
        duration_ms: u64,
    },
    /// Task paused for approval
    ApprovalRequired {
        /// Task identifier
        task_id: Uuid,
        /// Skill that needs approval
        skill_id: SkillId,
    },
    /// Task completed
    TaskCompleted {
        /// Task identifier
        task_id: Uuid,
        /// Aggregate validation verdict
        validation_passed: bool,
    },
    /// Task failed
    TaskFailed {
        /// Task identifier
        task_id: Uuid,
        /// Error description
        error: String,
    },
    /// Task was cancelled
    TaskCancelled {
        /// Task identifier
        task_id: Uuid,
    },
}

impl EngineEvent {
    /// Get the task_id from any event variant.
    #[must_use]
    pub fn task_id(&self) -> Uuid {
        match self {
            Self::TaskReceived { task_id, .. }
            | Self::TaskReplayed { task_id }
            | Self::StageEntered { task_id, .. }
            | Self::AttemptFinished { task_id, .. }
            | Self::ApprovalRequired { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskFailed { task_id, .. }
            | Self::TaskCancelled { task_id } => *task_id,
        }
    }
}

/// Broadcast-based event bus.
///
/// Slow subscribers miss events (lagged) rather than blocking the engine.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns the number of subscribers reached.
    pub fn publish(&self, event: EngineEvent) -> usize {
        // send() fails only when nobody is listening
        self.sender.send(event).unwrap_or(0)
    }

    /// Current number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
