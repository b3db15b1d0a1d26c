// src/exec/task_runner.rs

//! Drives one run from spawn to reap.

use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::display::Sink;
use crate::engine::{RunId, RunOutcome, RuntimeEvent};
use crate::exec::launcher::{is_no_such_process, ProcessLauncher, RunHandle};
use crate::exec::output;

/// How long output may keep arriving after the process was reaped.
pub const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

const COPY_BUFFER: usize = 8 * 1024;

enum Wake {
    Exited(io::Result<ExitStatus>),
    Control(Option<bool>),
}

/// Copy the run's output into `sink` while waiting for it to exit, then
/// write the trailer and report `RunExited`.
///
/// Each message on `control_rx` is a termination request (`true` for
/// graceful). Requests are applied as soon as they arrive, even while the
/// output copiers are blocked on a quiet pipe.
pub async fn run_command(
    mut handle: RunHandle,
    sink: Sink,
    launcher: Arc<dyn ProcessLauncher>,
    mut control_rx: mpsc::UnboundedReceiver<bool>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let run = handle.run;
    let copiers = spawn_copiers(&mut handle, &sink);

    let outcome = match wait_for_exit(&mut handle, launcher.as_ref(), &mut control_rx).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(run, error = %err, "failed to reap run");
            drain(run, copiers).await;
            let _ = runtime_tx
                .send(RuntimeEvent::ReapFailed {
                    run,
                    message: err.to_string(),
                })
                .await;
            return;
        }
    };

    drain(run, copiers).await;

    if let Err(err) = output::write_trailer(&sink, &outcome, Local::now()) {
        warn!(run, error = %err, "failed to write run trailer");
    }

    info!(run, ?outcome, "run finished");
    if runtime_tx
        .send(RuntimeEvent::RunExited { run, outcome })
        .await
        .is_err()
    {
        debug!(run, "runtime closed before the exit was delivered");
    }
}

async fn wait_for_exit(
    handle: &mut RunHandle,
    launcher: &dyn ProcessLauncher,
    control_rx: &mut mpsc::UnboundedReceiver<bool>,
) -> io::Result<RunOutcome> {
    let mut control_open = true;

    loop {
        let wake = tokio::select! {
            status = handle.child.wait() => Wake::Exited(status),
            graceful = control_rx.recv(), if control_open => Wake::Control(graceful),
        };

        match wake {
            Wake::Exited(Ok(status)) => return Ok(outcome_from_status(status)),
            Wake::Exited(Err(err)) if is_no_such_process(&err) => {
                debug!(run = handle.run, "process already gone");
                return Ok(RunOutcome::Lost);
            }
            Wake::Exited(Err(err)) => return Err(err),
            Wake::Control(Some(graceful)) => {
                if let Err(err) = launcher.terminate(handle, graceful) {
                    warn!(run = handle.run, graceful, error = %err, "failed to signal run");
                }
            }
            Wake::Control(None) => control_open = false,
        }
    }
}

pub fn outcome_from_status(status: ExitStatus) -> RunOutcome {
    if let Some(code) = status.code() {
        return RunOutcome::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return RunOutcome::Signaled(signal);
        }
    }
    RunOutcome::Lost
}

fn spawn_copiers(handle: &mut RunHandle, sink: &Sink) -> Vec<JoinHandle<()>> {
    let run = handle.run;
    let mut copiers = Vec::with_capacity(2);
    if let Some(stdout) = handle.child.stdout.take() {
        copiers.push(tokio::spawn(copy_output(stdout, sink.clone(), run, "stdout")));
    }
    if let Some(stderr) = handle.child.stderr.take() {
        copiers.push(tokio::spawn(copy_output(stderr, sink.clone(), run, "stderr")));
    }
    copiers
}

async fn copy_output<R>(mut reader: R, sink: Sink, run: RunId, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; COPY_BUFFER];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if let Err(err) = sink.write_all(&buf[..n]) {
                    warn!(run, stream, error = %err, "failed to write output");
                    break;
                }
            }
            Err(err) => {
                debug!(run, stream, error = %err, "output read failed");
                break;
            }
        }
    }
}

/// Wait for the copiers to hit EOF, giving up after [`DRAIN_TIMEOUT`] (a
/// background grandchild may hold the pipe open indefinitely).
async fn drain(run: RunId, copiers: Vec<JoinHandle<()>>) {
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    for copier in copiers {
        let abort = copier.abort_handle();
        if timeout_at(deadline, copier).await.is_err() {
            debug!(run, "output still open after exit; abandoning it");
            abort.abort();
        }
    }
}
