// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::engine::controller::ProcessController;
use crate::engine::debounce::PendingRun;
use crate::engine::{ChangeEvent, RunId, RunOutcome, RuntimeOptions, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// (Re)arm the single quiescence timer.
    ArmTimer(Duration),
    /// Clear the display and spawn the command as run `run`.
    StartRun { run: RunId, reason: TriggerReason },
    /// Signal run `run`: interrupt if `graceful`, kill otherwise.
    Terminate { run: RunId, graceful: bool },
    /// Arm the escalation timer for an interrupted run.
    ArmEscalation { run: RunId, after: Duration },
    /// Stop the watcher with an error.
    Abort { run: RunId, message: String },
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn stop_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// A change was observed: note its time and restart the quiescence window.
pub fn handle_change(
    pending: &mut PendingRun,
    options: &RuntimeOptions,
    change: ChangeEvent,
) -> CoreStep {
    debug!(path = ?change.path, "change observed");
    pending.observe_change(change.time);
    CoreStep::continue_with(vec![CoreCommand::ArmTimer(options.debounce)])
}

/// The quiescence window passed with no further change.
///
/// The run time is recorded before the run even starts so that the same
/// change cannot trigger twice.
pub fn handle_quiescence(
    pending: &mut PendingRun,
    controller: &mut ProcessController,
    now: SystemTime,
) -> CoreStep {
    if !pending.is_due() {
        debug!("quiescence elapsed; nothing changed since the last run");
        return CoreStep::continue_with(Vec::new());
    }
    pending.mark_run(now);
    CoreStep::continue_with(controller.request_run(TriggerReason::FileChange, now))
}

/// Explicit rerun from the display; skips the change check.
pub fn handle_rerun(
    pending: &mut PendingRun,
    controller: &mut ProcessController,
    now: SystemTime,
) -> CoreStep {
    info!("rerun requested");
    pending.mark_run(now);
    CoreStep::continue_with(controller.request_run(TriggerReason::UserRerun, now))
}

/// Explicit kill from the display. Also forgets any queued rerun.
pub fn handle_kill(controller: &mut ProcessController) -> CoreStep {
    info!(run = ?controller.active_run(), "kill requested");
    controller.cancel_queued();
    CoreStep::continue_with(controller.request_termination())
}

pub fn handle_grace_elapsed(controller: &mut ProcessController, run: RunId) -> CoreStep {
    CoreStep::continue_with(controller.grace_elapsed(run))
}

/// Dismiss / Ctrl-C: stop once nothing is running any more.
pub fn handle_shutdown(controller: &mut ProcessController, shutting_down: &mut bool) -> CoreStep {
    *shutting_down = true;
    controller.cancel_queued();
    if controller.is_idle() {
        info!("shutting down");
        return CoreStep::stop_with(Vec::new());
    }
    info!(run = ?controller.active_run(), "shutting down once the current run is reaped");
    CoreStep::continue_with(controller.request_termination())
}

/// A run has been reaped.
pub fn handle_run_exited(
    pending: &mut PendingRun,
    controller: &mut ProcessController,
    shutting_down: bool,
    run: RunId,
    outcome: RunOutcome,
    now: SystemTime,
) -> CoreStep {
    if !controller.finish(run, now) {
        debug!(run, "exit of a run that is not live; ignoring");
        return CoreStep::continue_with(Vec::new());
    }

    match outcome {
        RunOutcome::Exited(0) => info!(run, "run finished"),
        RunOutcome::Exited(code) => warn!(run, exit_code = code, "run failed"),
        RunOutcome::Signaled(signal) => info!(run, signal, "run terminated by signal"),
        RunOutcome::Lost => warn!(run, "run vanished before it could be reaped"),
    }

    pending.mark_run(now);

    if shutting_down {
        info!("run reaped; shutting down");
        return CoreStep::stop_with(Vec::new());
    }

    CoreStep::continue_with(controller.start_queued(now).into_iter().collect())
}

/// Reaping went wrong in a way that breaks our view of the process table.
pub fn handle_reap_failed(run: RunId, message: String) -> CoreStep {
    CoreStep::stop_with(vec![CoreCommand::Abort { run, message }])
}
