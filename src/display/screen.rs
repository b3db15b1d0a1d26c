// src/display/screen.rs

//! Interactive full-screen display.
//!
//! Before every run the terminal is cleared, so the screen always shows the
//! latest run only. One-word commands typed on stdin control the watcher:
//!
//! | input          | request   |
//! |----------------|-----------|
//! | `r`, `get`     | Rerun     |
//! | `k`, `kill`    | Kill      |
//! | `q`, `del`     | Dismiss   |

use std::io::{self, BufRead, Write};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Display, DisplayRequest, Sink};

/// Move the cursor home, clear the screen and the scrollback.
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J\x1b[3J";

pub struct ScreenDisplay {
    sink: Sink,
    input: Option<Box<dyn BufRead + Send>>,
}

impl ScreenDisplay {
    pub fn new(writer: impl Write + Send + 'static, input: impl BufRead + Send + 'static) -> Self {
        Self {
            sink: Sink::new(writer),
            input: Some(Box::new(input)),
        }
    }

    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::BufReader::new(io::stdin()))
    }
}

impl std::fmt::Debug for ScreenDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenDisplay")
            .field("reading_input", &self.input.is_none())
            .finish()
    }
}

impl Display for ScreenDisplay {
    fn redisplay(&mut self) -> io::Result<Sink> {
        self.sink.write_all(CLEAR_SCREEN.as_bytes())?;
        Ok(self.sink.clone())
    }

    fn requests(&mut self) -> Option<mpsc::Receiver<DisplayRequest>> {
        let input = self.input.take()?;
        let (tx, rx) = mpsc::channel(8);

        let spawned = thread::Builder::new()
            .name("watchrun-input".to_string())
            .spawn(move || read_requests(input, tx));

        match spawned {
            Ok(_) => Some(rx),
            Err(err) => {
                warn!(error = %err, "failed to start the input reader; commands disabled");
                None
            }
        }
    }
}

/// Map one input line to a request.
pub fn parse_request(line: &str) -> Option<DisplayRequest> {
    match line.trim().to_lowercase().as_str() {
        "r" | "get" => Some(DisplayRequest::Rerun),
        "k" | "kill" => Some(DisplayRequest::Kill),
        "q" | "del" => Some(DisplayRequest::Dismiss),
        _ => None,
    }
}

fn read_requests(input: Box<dyn BufRead + Send>, tx: mpsc::Sender<DisplayRequest>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                debug!(error = %err, "failed to read input");
                break;
            }
        };

        match parse_request(&line) {
            Some(request) => {
                debug!(?request, "display request");
                if tx.blocking_send(request).is_err() {
                    break;
                }
            }
            None if line.trim().is_empty() => {}
            None => debug!(command = %line.trim(), "unknown command"),
        }
    }
    debug!("input reader finished");
}
