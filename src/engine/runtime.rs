// src/engine/runtime.rs

use std::fmt;
use std::pin::Pin;
use std::time::SystemTime;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchrunError};
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RunId, RuntimeEvent};

/// What woke the loop up.
enum Wake {
    Event(Option<RuntimeEvent>),
    Quiescence,
    Grace,
}

/// The coordination loop.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. It owns the single quiescence timer (reset, never
/// stacked), the escalation timer, and the executor, and waits on those and
/// on the event channel at once.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    quiescence: Pin<Box<Sleep>>,
    quiescence_armed: bool,
    escalation: Pin<Box<Sleep>>,
    escalation_run: Option<RunId>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("quiescence_armed", &self.quiescence_armed)
            .field("escalation_run", &self.escalation_run)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            quiescence: Box::pin(sleep(std::time::Duration::ZERO)),
            quiescence_armed: false,
            escalation: Box::pin(sleep(std::time::Duration::ZERO)),
            escalation_run: None,
        }
    }

    /// Main event loop.
    ///
    /// - Runs the core's startup step (the unconditional first run).
    /// - Consumes `RuntimeEvent`s and timer expiries.
    /// - Feeds them into the core runtime and executes the returned commands.
    ///
    /// Returns `Ok(())` after a dismiss / shutdown, or the first fatal error.
    pub async fn run(mut self) -> Result<()> {
        info!("watchrun runtime started");

        let step = self.core.start();
        for command in step.commands {
            self.execute_command(command)?;
        }

        loop {
            let quiescence_armed = self.quiescence_armed;
            let escalation_armed = self.escalation_run.is_some();

            let wake = tokio::select! {
                event = self.event_rx.recv() => Wake::Event(event),
                () = &mut self.quiescence, if quiescence_armed => Wake::Quiescence,
                () = &mut self.escalation, if escalation_armed => Wake::Grace,
            };

            let event = match wake {
                Wake::Event(Some(event)) => event,
                Wake::Event(None) => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
                Wake::Quiescence => {
                    self.quiescence_armed = false;
                    RuntimeEvent::QuiescenceElapsed
                }
                Wake::Grace => match self.escalation_run.take() {
                    Some(run) => RuntimeEvent::GraceElapsed { run },
                    None => continue,
                },
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event, SystemTime::now());

            for command in step.commands {
                self.execute_command(command)?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Execute a single command from the core.
    fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::ArmTimer(delay) => {
                self.quiescence.as_mut().reset(Instant::now() + delay);
                self.quiescence_armed = true;
            }
            CoreCommand::StartRun { run, reason } => {
                info!(run, ?reason, "starting run");
                self.executor.start(run)?;
            }
            CoreCommand::Terminate { run, graceful } => {
                debug!(run, graceful, "terminating run");
                if let Err(err) = self.executor.terminate(run, graceful) {
                    warn!(run, graceful, error = %err, "failed to signal run");
                }
            }
            CoreCommand::ArmEscalation { run, after } => {
                self.escalation.as_mut().reset(Instant::now() + after);
                self.escalation_run = Some(run);
            }
            CoreCommand::Abort { run, message } => {
                return Err(WatchrunError::Reap { run, message });
            }
        }
        Ok(())
    }
}
