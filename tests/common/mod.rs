#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use watchrun_test_utils::{
    ExecLog, ExecRecord, FakeExecutor, SettingsBuilder, init_tracing, with_timeout,
};

use watchrun::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use watchrun::errors::Result;
use watchrun::exec::ExecutorBackend;

/// Start a runtime around `executor` on a background task.
pub fn spawn_runtime<E>(
    options: RuntimeOptions,
    executor_for: impl FnOnce(mpsc::Sender<RuntimeEvent>) -> E,
) -> (mpsc::Sender<RuntimeEvent>, JoinHandle<Result<()>>)
where
    E: ExecutorBackend + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let executor = executor_for(tx.clone());
    let core = CoreRuntime::new(options, std::time::SystemTime::now());
    let handle = tokio::spawn(Runtime::new(core, rx, executor).run());
    (tx, handle)
}

/// Poll `check` every few milliseconds until it holds (5s cap).
pub async fn eventually(mut check: impl FnMut() -> bool) {
    with_timeout(async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

pub fn records(log: &ExecLog) -> Vec<ExecRecord> {
    log.lock().unwrap().clone()
}
