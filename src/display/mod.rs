// src/display/mod.rs

//! Display adapters: where command output goes, and where user requests
//! (rerun / kill / dismiss) come from.
//!
//! - [`terminal`] writes to our own stdout and is never interactive (`-t`).
//! - [`screen`] clears the terminal before each run and reads one-word
//!   commands from stdin (the default).

pub mod screen;
pub mod terminal;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::types::DisplayMode;

pub use screen::ScreenDisplay;
pub use terminal::TerminalDisplay;

/// A user-initiated request coming from the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRequest {
    /// Stop the current run (if any) and run the command again.
    Rerun,
    /// Stop the current run.
    Kill,
    /// Stop the current run and exit.
    Dismiss,
}

/// Rendering surface for runs.
pub trait Display: Send {
    /// Clear whatever the previous run left behind and return the sink the
    /// next run writes into.
    fn redisplay(&mut self) -> io::Result<Sink>;

    /// The stream of user requests. `None` for surfaces with no interactivity.
    /// Only the first call may return `Some`.
    fn requests(&mut self) -> Option<mpsc::Receiver<DisplayRequest>> {
        None
    }
}

/// Build the display for `mode`, attached to the real stdout / stdin.
pub fn build_display(mode: DisplayMode) -> Box<dyn Display> {
    match mode {
        DisplayMode::Terminal => Box::new(TerminalDisplay::stdout()),
        DisplayMode::Screen => Box::new(ScreenDisplay::stdio()),
    }
}

/// Shared, cloneable writer. The stdout and stderr copiers of a run write into
/// clones of the same sink, so their output interleaves in arrival order.
#[derive(Clone)]
pub struct Sink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Sink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write all of `buf` and flush, so output shows up live.
    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(buf)?;
        writer.flush()
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.write_all(&buf)
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// In-memory writer whose clones share one buffer. Used to capture output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn clear(&self) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
