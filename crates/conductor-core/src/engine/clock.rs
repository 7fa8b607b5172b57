//! Stage timing

use super::types::{EngineState, StageRecord};
use std::time::{Duration, Instant};

/// Records how long a task spends in each state
#[derive(Debug)]
pub struct StageClock {
    records: Vec<StageRecord>,
    current: Option<(EngineState, Instant)>,
}

impl StageClock {
    /// Start timing in `state`
    #[must_use]
    pub fn start(state: EngineState) -> Self {
        Self {
            records: Vec::new(),
            current: Some((state, Instant::now())),
        }
    }

    /// Continue timing from stored records, already `elapsed` into `state`
    #[must_use]
    pub fn resume(records: Vec<StageRecord>, state: EngineState, elapsed: Duration) -> Self {
        let now = Instant::now();
        Self {
            records,
            current: Some((state, now.checked_sub(elapsed).unwrap_or(now))),
        }
    }

    /// Close the current state and enter `state`
    pub fn enter(&mut self, state: EngineState) {
        self.close();
        self.current = Some((state, Instant::now()));
    }

    /// State currently being timed
    #[must_use]
    pub fn current(&self) -> Option<EngineState> {
        self.current.map(|(state, _)| state)
    }

    /// Records of the states already left
    #[must_use]
    pub fn closed(&self) -> Vec<StageRecord> {
        self.records.clone()
    }

    /// Records so far, including the open state up to now
    #[must_use]
    pub fn snapshot(&self) -> Vec<StageRecord> {
        let mut records = self.records.clone();
        if let Some((state, since)) = self.current {
            records.push(StageRecord {
                state,
                duration_ms: since.elapsed().as_millis() as u64,
            });
        }
        records
    }

    /// Close the current state and append a zero-length terminal record
    #[must_use]
    pub fn finish(mut self, terminal: EngineState) -> Vec<StageRecord> {
        self.close();
        self.records.push(StageRecord {
            state: terminal,
            duration_ms: 0,
        });
        self.records
    }

    fn close(&mut self) {
        if let Some((state, since)) = self.current.take() {
            self.records.push(StageRecord {
                state,
                duration_ms: since.elapsed().as_millis() as u64,
            });
        }
    }
}
