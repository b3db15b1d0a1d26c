// src/display/terminal.rs

use std::io::{self, Write};

use super::{Display, Sink};

/// Plain writer display: every run is appended to the same stream.
#[derive(Debug, Clone)]
pub struct TerminalDisplay {
    sink: Sink,
}

impl TerminalDisplay {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Sink::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Display for TerminalDisplay {
    fn redisplay(&mut self) -> io::Result<Sink> {
        Ok(self.sink.clone())
    }
}
