// src/exec/output.rs

//! Framing around a run's output: the command line on top, then the exit
//! status (only when it is not a clean exit) and a completion timestamp.

use std::io;

use chrono::{DateTime, Local};

use crate::display::Sink;
use crate::engine::RunOutcome;
use crate::types::CommandSpec;

pub fn write_header(sink: &Sink, spec: &CommandSpec) -> io::Result<()> {
    sink.write_line(&spec.display_line())
}

/// The status line for `outcome`, or `None` for a clean exit.
pub fn status_line(outcome: &RunOutcome) -> Option<String> {
    match outcome {
        RunOutcome::Exited(0) => None,
        RunOutcome::Exited(code) => Some(format!("exit status {code}")),
        RunOutcome::Signaled(signal) => Some(format!("signal: {signal}")),
        RunOutcome::Lost => Some("exit status unknown".to_string()),
    }
}

pub fn timestamp_line(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.3f %z").to_string()
}

pub fn write_trailer(sink: &Sink, outcome: &RunOutcome, at: DateTime<Local>) -> io::Result<()> {
    if let Some(line) = status_line(outcome) {
        sink.write_line(&line)?;
    }
    sink.write_line(&timestamp_line(at))
}
