use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Where command output is rendered.
///
/// - `Terminal`: write straight to our own stdout, never clearing.
/// - `Screen`: clear the terminal before each run and accept interactive
///   rerun / kill / dismiss commands on stdin (default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Terminal,
    Screen,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Screen
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terminal" => Ok(DisplayMode::Terminal),
            "screen" => Ok(DisplayMode::Screen),
            other => Err(format!(
                "invalid display mode: {other} (expected \"terminal\" or \"screen\")"
            )),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Terminal => f.write_str("terminal"),
            DisplayMode::Screen => f.write_str("screen"),
        }
    }
}

/// The command to run on every rebuild: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build from a `COMMAND [ARGS...]` vector. Returns `None` when empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// The header line echoed at the top of every run's output.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
