// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;

use notify::{Config, Event, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::RuntimeEvent;
use crate::errors::{Result, WatchrunError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::exclude::ExcludeFilter;
use crate::watch::normalizer::EventNormalizer;
use crate::watch::registry::{NotifyBackend, WatchBackend, WatchRegistry};

/// Handle for the filesystem watcher.
///
/// The `notify` watcher lives on the delivery thread together with the
/// normalizer, so this handle only reports on it.
#[derive(Debug)]
pub struct WatcherHandle {
    root: PathBuf,
    thread: thread::JoinHandle<()>,
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }
}

/// Start watching the tree under `root` and forward normalized changes as
/// `RuntimeEvent::Changed` into `runtime_tx`.
///
/// Failing to create the OS watcher or to stat the root is fatal; so is a
/// root that does not exist at startup. Everything after that is logged.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    exclude: ExcludeFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let given = root.into();
    // Canonicalize once so event paths and the exclude filter agree.
    let root = given.canonicalize().unwrap_or_else(|_| given.clone());
    let exclude = exclude.relative_to(root.clone(), given);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    if let Err(err) = fs.stat(&root) {
        return Err(WatchrunError::Usage(format!(
            "cannot watch {}: {err}",
            root.display()
        )));
    }

    // notify calls back on its own thread; events queue here until the
    // delivery thread picks them up.
    let (raw_tx, raw_rx) = std_mpsc::channel::<notify::Result<Event>>();
    let watcher = RecommendedWatcher::new(raw_tx, Config::default())?;

    let mut registry = WatchRegistry::new(NotifyBackend::new(watcher), fs, exclude);
    let watched = registry.register_tree(&root)?;
    info!(root = ?root, watched, "file watcher started");

    let normalizer = EventNormalizer::new(registry);
    let thread = thread::Builder::new()
        .name("watchrun-fs".to_string())
        .spawn(move || forward_events(normalizer, raw_rx, runtime_tx))?;

    Ok(WatcherHandle { root, thread })
}

/// Delivery loop: normalize each notification and push the resulting changes
/// into the coordination loop, blocking while its queue is full.
///
/// Returns when the raw stream ends or the runtime has gone away.
pub fn forward_events<B: WatchBackend>(
    mut normalizer: EventNormalizer<B>,
    raw_rx: std_mpsc::Receiver<notify::Result<Event>>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    for result in raw_rx {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                error!(error = %err, "file watch error");
                continue;
            }
        };

        for change in normalizer.normalize(&event) {
            if runtime_tx.blocking_send(RuntimeEvent::Changed(change)).is_err() {
                debug!("runtime closed; stopping watcher");
                return;
            }
        }
    }
    debug!("watcher event stream finished");
}
