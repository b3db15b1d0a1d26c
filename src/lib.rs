// src/lib.rs

pub mod cli;
pub mod config;
pub mod display;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_settings;
use crate::display::{build_display, DisplayRequest};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent};
use crate::errors::Result;
use crate::exec::{platform_launcher, RealExecutorBackend};
use crate::watch::spawn_watcher;

/// Capacity of the channel into the coordination loop.
pub const RUNTIME_CHANNEL_CAPACITY: usize = 64;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings (command line + optional config file)
/// - the display and its user requests
/// - the file watcher
/// - Ctrl-C handling
/// - the executor and the coordination runtime
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args)?;
    info!(
        root = ?settings.root,
        exclude = ?settings.exclude,
        command = %settings.command.display_line(),
        display = %settings.display,
        "starting watchrun"
    );

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(RUNTIME_CHANNEL_CAPACITY);

    let _watcher = spawn_watcher(&settings.root, settings.exclude.clone(), rt_tx.clone())?;

    let mut display = build_display(settings.display);
    if let Some(requests) = display.requests() {
        tokio::spawn(forward_requests(requests, rt_tx.clone()));
    }

    // Ctrl-C behaves like dismissing the display.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let executor = RealExecutorBackend::new(
        settings.command.clone(),
        display,
        platform_launcher(),
        rt_tx,
    );

    // Construct the pure core runtime (single source of truth for semantics).
    let core = CoreRuntime::new(settings.runtime_options(), SystemTime::now());

    // Construct the async IO shell around the core.
    let runtime = Runtime::new(core, rt_rx, executor);
    runtime.run().await
}

/// Translate display requests into runtime events until either side closes.
pub async fn forward_requests(
    mut requests: mpsc::Receiver<DisplayRequest>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    while let Some(request) = requests.recv().await {
        let event = match request {
            DisplayRequest::Rerun => RuntimeEvent::RerunRequested,
            DisplayRequest::Kill => RuntimeEvent::KillRequested,
            DisplayRequest::Dismiss => RuntimeEvent::DismissRequested,
        };
        if runtime_tx.send(event).await.is_err() {
            break;
        }
    }
    debug!("display request stream finished");
}
