//! Engine configuration

use conductor_skills::RouterConfig;
use std::time::Duration;

/// Configuration for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Router scoring configuration
    pub router: RouterConfig,
    /// Deadline per execution attempt, unless the skill overrides it
    pub attempt_timeout: Duration,
    /// Deadline for the whole validation battery
    pub validation_timeout: Duration,
    /// How often a losing duplicate submission re-checks the store
    pub replay_poll_interval: Duration,
    /// How long a losing duplicate submission waits for the winner
    pub replay_wait_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            router: RouterConfig::default(),
            attempt_timeout: Duration::from_secs(30),
            validation_timeout: Duration::from_secs(5),
            replay_poll_interval: Duration::from_millis(50),
            replay_wait_timeout: Duration::from_secs(120),
        }
    }
}

impl EngineConfig {
    /// Set the router configuration
    #[must_use]
    pub fn with_router(mut self, router: RouterConfig) -> Self {
        self.router = router;
        self
    }

    /// Set the per-attempt deadline
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Set the validation deadline
    #[must_use]
    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Set the replay poll interval
    #[must_use]
    pub fn with_replay_poll_interval(mut self, interval: Duration) -> Self {
        self.replay_poll_interval = interval;
        self
    }

    /// Set how long duplicates wait for the winner
    #[must_use]
    pub fn with_replay_wait_timeout(mut self, timeout: Duration) -> Self {
        self.replay_wait_timeout = timeout;
        self
    }
}
