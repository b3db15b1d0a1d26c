// src/engine/controller.rs

//! Process controller state machine.
//!
//! Owns the lifecycle of the spawned command from the coordination loop's
//! point of view. It never touches a process itself: every transition yields
//! [`CoreCommand`]s for the IO shell to carry out.
//!
//! ```text
//!   Idle --run--> Running --terminate--> Terminating(Interrupted)
//!                    |                        |  terminate / grace elapsed
//!                    |                        v
//!                    |                   Terminating(Killed)
//!                    |                        |
//!                    +------- exited ---------+--> Idle (or next queued run)
//! ```
//!
//! At most one run is live, and at most one further run is queued behind it.

use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::engine::event_handlers::CoreCommand;
use crate::engine::{RunId, TriggerReason};

/// How far termination of the current run has escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// The graceful interrupt has been sent.
    Interrupted,
    /// The forceful kill has been sent.
    Killed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running {
        run: RunId,
        started: SystemTime,
    },
    Terminating {
        run: RunId,
        started: SystemTime,
        escalation: Escalation,
    },
}

#[derive(Debug)]
pub struct ProcessController {
    state: ControllerState,
    next_run: RunId,
    queued: Option<TriggerReason>,
    grace: Duration,
    last_completed: Option<SystemTime>,
}

impl ProcessController {
    pub fn new(grace: Duration) -> Self {
        Self {
            state: ControllerState::Idle,
            next_run: 1,
            queued: None,
            grace,
            last_completed: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ControllerState::Idle
    }

    /// The live run, if any.
    pub fn active_run(&self) -> Option<RunId> {
        match self.state {
            ControllerState::Idle => None,
            ControllerState::Running { run, .. } | ControllerState::Terminating { run, .. } => {
                Some(run)
            }
        }
    }

    pub fn has_queued_run(&self) -> bool {
        self.queued.is_some()
    }

    pub fn last_completed(&self) -> Option<SystemTime> {
        self.last_completed
    }

    /// A rebuild was requested.
    ///
    /// Idle: start immediately. Otherwise remember that one more run is
    /// wanted (a newer request replaces an older one) and terminate the
    /// live run, escalating if it is already being terminated.
    pub fn request_run(&mut self, reason: TriggerReason, now: SystemTime) -> Vec<CoreCommand> {
        if self.is_idle() {
            return vec![self.start(reason, now)];
        }
        self.queued = Some(reason);
        self.request_termination()
    }

    /// Terminate the live run: interrupt first, kill on any later request.
    pub fn request_termination(&mut self) -> Vec<CoreCommand> {
        match self.state {
            ControllerState::Idle => Vec::new(),
            ControllerState::Running { run, started } => {
                debug!(run, "interrupting run");
                self.state = ControllerState::Terminating {
                    run,
                    started,
                    escalation: Escalation::Interrupted,
                };
                vec![
                    CoreCommand::Terminate {
                        run,
                        graceful: true,
                    },
                    CoreCommand::ArmEscalation {
                        run,
                        after: self.grace,
                    },
                ]
            }
            ControllerState::Terminating { run, started, .. } => {
                debug!(run, "killing run");
                self.state = ControllerState::Terminating {
                    run,
                    started,
                    escalation: Escalation::Killed,
                };
                vec![CoreCommand::Terminate {
                    run,
                    graceful: false,
                }]
            }
        }
    }

    /// The grace window for `run` ran out; kill it if it is still only
    /// interrupted.
    pub fn grace_elapsed(&mut self, run: RunId) -> Vec<CoreCommand> {
        match self.state {
            ControllerState::Terminating {
                run: active,
                escalation: Escalation::Interrupted,
                ..
            } if active == run => self.request_termination(),
            _ => Vec::new(),
        }
    }

    /// Drop a queued run, if any.
    pub fn cancel_queued(&mut self) {
        self.queued = None;
    }

    /// Record that `run` has been reaped. Returns `false` (and changes
    /// nothing) if `run` is not the live run.
    pub fn finish(&mut self, run: RunId, now: SystemTime) -> bool {
        if self.active_run() != Some(run) {
            return false;
        }
        self.state = ControllerState::Idle;
        self.last_completed = Some(now);
        true
    }

    /// Start the queued run, if one is waiting and the controller is idle.
    pub fn start_queued(&mut self, now: SystemTime) -> Option<CoreCommand> {
        if !self.is_idle() {
            return None;
        }
        let reason = self.queued.take()?;
        Some(self.start(reason, now))
    }

    fn start(&mut self, reason: TriggerReason, now: SystemTime) -> CoreCommand {
        let run = self.next_run;
        self.next_run += 1;
        self.state = ControllerState::Running { run, started: now };
        CoreCommand::StartRun { run, reason }
    }
}
