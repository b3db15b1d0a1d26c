use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use watchrun::engine::{RunId, RunOutcome, RuntimeEvent};
use watchrun::errors::Result;
use watchrun::exec::ExecutorBackend;

/// What the runtime asked the executor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecRecord {
    Started(RunId),
    Terminated { run: RunId, graceful: bool },
}

/// Shared, inspectable record of executor calls.
pub type ExecLog = Arc<Mutex<Vec<ExecRecord>>>;

/// A fake executor that:
/// - records every start / terminate call
/// - never spawns anything
/// - reports `RunExited` right away when configured to, and otherwise when
///   the run is signalled (`Signaled(15)` for the interrupt unless told to
///   ignore it, `Signaled(9)` for the kill).
///
/// Exits are pushed with `try_send` so they are queued behind whatever the
/// runtime is currently processing, like a real reaped child.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: ExecLog,
    completes_with: Option<RunOutcome>,
    ignores_interrupt: bool,
    active: Option<RunId>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, log: ExecLog) -> Self {
        Self {
            runtime_tx,
            log,
            completes_with: None,
            ignores_interrupt: false,
            active: None,
        }
    }

    /// Every run exits on its own with `outcome` as soon as it starts.
    pub fn completes_with(mut self, outcome: RunOutcome) -> Self {
        self.completes_with = Some(outcome);
        self
    }

    /// Runs survive the graceful signal and only die on the kill.
    pub fn ignores_interrupt(mut self) -> Self {
        self.ignores_interrupt = true;
        self
    }

    pub fn new_log() -> ExecLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(&self, record: ExecRecord) {
        self.log.lock().unwrap().push(record);
    }

    fn exit(&mut self, run: RunId, outcome: RunOutcome) {
        self.active = None;
        self.runtime_tx
            .try_send(RuntimeEvent::RunExited { run, outcome })
            .expect("runtime channel full or closed");
    }
}

impl ExecutorBackend for FakeExecutor {
    fn start(&mut self, run: RunId) -> Result<()> {
        assert!(
            self.active.is_none(),
            "run {run} started while run {:?} is still alive",
            self.active
        );
        self.record(ExecRecord::Started(run));
        self.active = Some(run);

        if let Some(outcome) = self.completes_with {
            self.exit(run, outcome);
        }
        Ok(())
    }

    fn terminate(&mut self, run: RunId, graceful: bool) -> Result<()> {
        self.record(ExecRecord::Terminated { run, graceful });

        if self.active != Some(run) {
            return Ok(());
        }
        if !graceful {
            self.exit(run, RunOutcome::Signaled(9));
        } else if !self.ignores_interrupt {
            self.exit(run, RunOutcome::Signaled(15));
        }
        Ok(())
    }
}
