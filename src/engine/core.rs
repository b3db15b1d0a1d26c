// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s (plus the current wall-clock time) and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - driving the quiescence and escalation timers
//! - starting and signalling processes through the executor
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use std::time::{Duration, SystemTime};

use crate::engine::controller::{ControllerState, ProcessController};
use crate::engine::debounce::PendingRun;
use crate::engine::event_handlers::{
    handle_change, handle_grace_elapsed, handle_kill, handle_quiescence, handle_reap_failed,
    handle_rerun, handle_run_exited, handle_shutdown, CoreCommand, CoreStep,
};
use crate::engine::{RuntimeEvent, RuntimeOptions};

/// Pure core runtime state.
///
/// This owns:
/// - the pending-run timestamps
/// - the process controller
/// - runtime options (debounce, grace)
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    pending: PendingRun,
    controller: ProcessController,
    options: RuntimeOptions,
    shutting_down: bool,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions, now: SystemTime) -> Self {
        Self {
            pending: PendingRun::new(now),
            controller: ProcessController::new(options.grace),
            options,
            shutting_down: false,
        }
    }

    /// Commands to issue before the first event: fire the quiescence timer
    /// immediately so the command runs once at startup.
    pub fn start(&mut self) -> CoreStep {
        CoreStep::continue_with(vec![CoreCommand::ArmTimer(Duration::ZERO)])
    }

    pub fn pending(&self) -> &PendingRun {
        &self.pending
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Expose whether nothing is running (for tests).
    pub fn is_idle(&self) -> bool {
        self.controller.is_idle()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent, now: SystemTime) -> CoreStep {
        match event {
            RuntimeEvent::Changed(change) => handle_change(&mut self.pending, &self.options, change),
            RuntimeEvent::QuiescenceElapsed => {
                handle_quiescence(&mut self.pending, &mut self.controller, now)
            }
            RuntimeEvent::GraceElapsed { run } => handle_grace_elapsed(&mut self.controller, run),
            RuntimeEvent::RerunRequested => {
                handle_rerun(&mut self.pending, &mut self.controller, now)
            }
            RuntimeEvent::KillRequested => handle_kill(&mut self.controller),
            RuntimeEvent::DismissRequested | RuntimeEvent::ShutdownRequested => {
                handle_shutdown(&mut self.controller, &mut self.shutting_down)
            }
            RuntimeEvent::RunExited { run, outcome } => handle_run_exited(
                &mut self.pending,
                &mut self.controller,
                self.shutting_down,
                run,
                outcome,
                now,
            ),
            RuntimeEvent::ReapFailed { run, message } => handle_reap_failed(run, message),
        }
    }
}
