// src/engine/mod.rs

//! Coordination engine for watchrun.
//!
//! This module ties together:
//! - the debounce scheduler (`PendingRun`: last change vs. last run)
//! - the process controller (`Idle` / `Running` / `Terminating`)
//! - the main runtime event loop that reacts to:
//!   - normalized filesystem changes
//!   - the quiescence and escalation timers
//!   - process exits
//!   - user rerun / kill / dismiss requests and Ctrl-C
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Identifies one execution of the command. Strictly increasing.
pub type RunId = u64;

/// Default quiescence window between the last change and the rebuild.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Default time a run gets to exit after the interrupt before it is killed.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(1000);

/// Effective change time for a path, as resolved by the event normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub time: SystemTime,
}

/// Why a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The quiescence window elapsed after one or more changes (this
    /// includes the unconditional first run at startup).
    FileChange,
    /// The user asked for a rerun from the display.
    UserRerun,
}

/// How a run ended, as observed when the process was reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exited(i32),
    Signaled(i32),
    /// The OS no longer knew the process when we tried to reap it.
    Lost,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        matches!(self, RunOutcome::Exited(0))
    }
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Quiescence window.
    pub debounce: Duration,
    /// Wall-clock grace window between interrupt and kill.
    pub grace: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            grace: DEFAULT_GRACE,
        }
    }
}

/// Events flowing into the coordination loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Something changed in the watched tree.
    Changed(ChangeEvent),
    /// The quiescence timer fired.
    QuiescenceElapsed,
    /// The grace window for an interrupted run ran out.
    GraceElapsed { run: RunId },
    /// The user asked to rerun the command now.
    RerunRequested,
    /// The user asked to stop the current run.
    KillRequested,
    /// The user closed the display: stop the run and exit.
    DismissRequested,
    /// Ctrl-C.
    ShutdownRequested,
    /// A run's process has been reaped.
    RunExited { run: RunId, outcome: RunOutcome },
    /// Reaping a run failed in a way we cannot reason about.
    ReapFailed { run: RunId, message: String },
}

pub mod controller;
pub mod core;
pub mod debounce;
pub mod event_handlers;
pub mod runtime;

pub use self::controller::{ControllerState, Escalation, ProcessController};
pub use self::core::CoreRuntime;
pub use self::debounce::PendingRun;
pub use self::event_handlers::{CoreCommand, CoreStep};
pub use self::runtime::Runtime;
