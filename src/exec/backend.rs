// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests.
//!
//! - `RealExecutorBackend` is the implementation used by `watchrun`. It
//!   clears the display, spawns the command through a [`ProcessLauncher`]
//!   and hands the run to [`run_command`].
//! - Tests can provide their own `ExecutorBackend` that records which runs
//!   were started or signalled and emits `RunExited` events on demand.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::display::Display;
use crate::engine::{RunId, RuntimeEvent};
use crate::errors::{Result, WatchrunError};
use crate::exec::launcher::ProcessLauncher;
use crate::exec::output;
use crate::exec::task_runner::run_command;
use crate::types::CommandSpec;

/// How the runtime starts and stops runs.
///
/// Both calls return immediately; the end of a run is reported later as
/// `RuntimeEvent::RunExited` (or `ReapFailed`) on the runtime channel.
pub trait ExecutorBackend: Send {
    /// Start run `run`. An error here is fatal.
    fn start(&mut self, run: RunId) -> Result<()>;

    /// Deliver a termination request to run `run` if it is still active.
    fn terminate(&mut self, run: RunId, graceful: bool) -> Result<()>;
}

struct ActiveRun {
    run: RunId,
    control: mpsc::UnboundedSender<bool>,
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    command: CommandSpec,
    display: Box<dyn Display>,
    launcher: Arc<dyn ProcessLauncher>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    active: Option<ActiveRun>,
}

impl RealExecutorBackend {
    pub fn new(
        command: CommandSpec,
        display: Box<dyn Display>,
        launcher: Arc<dyn ProcessLauncher>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            command,
            display,
            launcher,
            runtime_tx,
            active: None,
        }
    }

    /// The most recently started run.
    pub fn active_run(&self) -> Option<RunId> {
        self.active.as_ref().map(|active| active.run)
    }
}

impl std::fmt::Debug for RealExecutorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealExecutorBackend")
            .field("command", &self.command)
            .field("launcher", &self.launcher)
            .field("active", &self.active_run())
            .finish_non_exhaustive()
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn start(&mut self, run: RunId) -> Result<()> {
        let sink = self.display.redisplay()?;
        output::write_header(&sink, &self.command)?;

        let handle = match self.launcher.start_in_group(&self.command, run) {
            Ok(handle) => handle,
            Err(source) => {
                let _ = sink.write_line(&format!("fatal: {source}"));
                return Err(WatchrunError::Spawn {
                    command: self.command.display_line(),
                    source,
                });
            }
        };
        info!(run, pid = ?handle.pid(), "run started");

        let (control, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_command(
            handle,
            sink,
            Arc::clone(&self.launcher),
            control_rx,
            self.runtime_tx.clone(),
        ));
        self.active = Some(ActiveRun { run, control });
        Ok(())
    }

    fn terminate(&mut self, run: RunId, graceful: bool) -> Result<()> {
        match &self.active {
            Some(active) if active.run == run => {
                if active.control.send(graceful).is_err() {
                    debug!(run, "run already finished; not signalling");
                }
                Ok(())
            }
            _ => {
                debug!(run, "termination for a run that is not active");
                Ok(())
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::display::{SharedBuffer, TerminalDisplay};
    use crate::engine::RunOutcome;
    use crate::exec::launcher::platform_launcher;
    use std::time::Duration;

    fn backend(
        argv: &[&str],
    ) -> (RealExecutorBackend, SharedBuffer, mpsc::Receiver<RuntimeEvent>) {
        let argv: Vec<String> = argv.iter().map(|s| s.to_string()).collect();
        let buffer = SharedBuffer::new();
        let (tx, rx) = mpsc::channel(8);
        let backend = RealExecutorBackend::new(
            CommandSpec::from_argv(&argv).unwrap(),
            Box::new(TerminalDisplay::new(buffer.clone())),
            platform_launcher(),
            tx,
        );
        (backend, buffer, rx)
    }

    async fn next(rx: &mut mpsc::Receiver<RuntimeEvent>) -> RuntimeEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("run should finish")
            .expect("channel open")
    }

    #[tokio::test]
    async fn echo_output_is_framed() {
        let (mut backend, buffer, mut rx) = backend(&["echo", "hi"]);
        backend.start(1).unwrap();

        assert_eq!(
            next(&mut rx).await,
            RuntimeEvent::RunExited {
                run: 1,
                outcome: RunOutcome::Exited(0)
            }
        );
        let out = buffer.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[..2], ["echo hi", "hi"]);
        assert_eq!(lines.len(), 3, "timestamp only, no status line: {out:?}");
    }

    #[tokio::test]
    async fn spawn_failure_is_reported_and_fatal() {
        let (mut backend, buffer, _rx) = backend(&["watchrun-no-such-program"]);
        let err = backend.start(1).unwrap_err();

        assert!(matches!(err, WatchrunError::Spawn { .. }));
        assert!(buffer.contents().contains("fatal: "));
    }

    #[tokio::test]
    async fn terminate_stops_a_long_run() {
        let (mut backend, _buffer, mut rx) = backend(&["sleep", "30"]);
        backend.start(1).unwrap();
        backend.terminate(1, true).unwrap();

        assert_eq!(
            next(&mut rx).await,
            RuntimeEvent::RunExited {
                run: 1,
                outcome: RunOutcome::Signaled(15)
            }
        );
        // Stale ids are ignored.
        backend.terminate(7, false).unwrap();
    }
}
