// tests/real_process.rs
#![cfg(unix)]

mod common;
use crate::common::{eventually, init_tracing, spawn_runtime, with_timeout, SettingsBuilder};

use std::time::Duration;

use watchrun::display::{SharedBuffer, TerminalDisplay};
use watchrun::engine::{RuntimeEvent, RuntimeOptions};
use watchrun::errors::WatchrunError;
use watchrun::exec::{platform_launcher, RealExecutorBackend};

/// Spawn a runtime that runs `argv` for real, writing into a buffer.
fn start(
    argv: &[&str],
) -> (
    SharedBuffer,
    tokio::sync::mpsc::Sender<RuntimeEvent>,
    tokio::task::JoinHandle<watchrun::errors::Result<()>>,
) {
    let settings = SettingsBuilder::new().command(argv).build();
    let buffer = SharedBuffer::new();
    let display = TerminalDisplay::new(buffer.clone());
    let command = settings.command.clone();

    let options = RuntimeOptions {
        debounce: Duration::from_millis(20),
        grace: Duration::from_millis(200),
    };
    let (tx, runtime) = spawn_runtime(options, move |tx| {
        RealExecutorBackend::new(command, Box::new(display), platform_launcher(), tx)
    });
    (buffer, tx, runtime)
}

fn line_count(buffer: &SharedBuffer) -> usize {
    buffer.contents().lines().count()
}

#[tokio::test]
async fn successful_run_shows_command_output_and_timestamp() {
    init_tracing();
    let (buffer, tx, runtime) = start(&["echo", "hi"]);

    eventually(|| line_count(&buffer) >= 3).await;
    tx.send(RuntimeEvent::DismissRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();

    let out = buffer.contents();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected output: {out:?}");
    assert_eq!(lines[0], "echo hi");
    assert_eq!(lines[1], "hi");
    assert!(!out.contains("exit status"));
}

#[tokio::test]
async fn failing_run_reports_its_exit_status() {
    init_tracing();
    let (buffer, tx, runtime) = start(&["false"]);

    eventually(|| buffer.contents().contains("exit status 1")).await;
    tx.send(RuntimeEvent::DismissRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();
}

#[tokio::test]
async fn stderr_is_shown_alongside_stdout() {
    init_tracing();
    let (buffer, tx, runtime) = start(&["sh", "-c", "echo out; echo err >&2"]);

    eventually(|| line_count(&buffer) >= 4).await;
    tx.send(RuntimeEvent::DismissRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();

    let out = buffer.contents();
    assert!(out.contains("out\n"));
    assert!(out.contains("err\n"));
}

#[tokio::test]
async fn rerun_interrupts_a_long_run_and_starts_again() {
    init_tracing();
    let (buffer, tx, runtime) = start(&["sleep", "30"]);

    eventually(|| line_count(&buffer) >= 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(RuntimeEvent::RerunRequested).await.unwrap();

    eventually(|| buffer.contents().matches("sleep 30").count() == 2).await;
    assert!(buffer.contents().contains("signal: 15"));

    tx.send(RuntimeEvent::DismissRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();
}

#[tokio::test]
async fn run_ignoring_the_interrupt_is_killed() {
    init_tracing();
    let (buffer, tx, runtime) = start(&["sh", "-c", "trap '' TERM; echo ready; sleep 30"]);

    eventually(|| buffer.contents().contains("ready")).await;
    tx.send(RuntimeEvent::KillRequested).await.unwrap();

    eventually(|| buffer.contents().contains("signal: 9")).await;
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    with_timeout(runtime).await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_program_is_fatal() {
    init_tracing();
    let (buffer, _tx, runtime) = start(&["watchrun-definitely-not-installed"]);

    let err = with_timeout(runtime).await.unwrap().unwrap_err();
    assert!(matches!(err, WatchrunError::Spawn { .. }));
    assert!(buffer.contents().contains("fatal: "));
}
