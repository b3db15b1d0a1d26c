// src/engine/debounce.rs

use std::time::{SystemTime, UNIX_EPOCH};

/// Last observed change versus last run.
///
/// A rebuild is due whenever the last run is older than the last change.
/// Both timestamps only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRun {
    last_change: SystemTime,
    last_run: SystemTime,
}

impl PendingRun {
    /// Startup state: a change "now" and no run yet, so the first run is due.
    pub fn new(now: SystemTime) -> Self {
        Self {
            last_change: now,
            last_run: UNIX_EPOCH,
        }
    }

    pub fn last_change(&self) -> SystemTime {
        self.last_change
    }

    pub fn last_run(&self) -> SystemTime {
        self.last_run
    }

    pub fn is_due(&self) -> bool {
        self.last_run < self.last_change
    }

    pub fn observe_change(&mut self, time: SystemTime) {
        self.last_change = self.last_change.max(time);
    }

    pub fn mark_run(&mut self, now: SystemTime) {
        self.last_run = self.last_run.max(now);
    }
}
