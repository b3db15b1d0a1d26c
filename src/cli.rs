// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Watch a directory tree and rerun a command whenever something changes.",
    long_about = None
)]
pub struct CliArgs {
    /// The path to watch.
    ///
    /// Default: the current directory (or `[watch].path` from `--config`).
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Exclude files and directories whose path matches this regular expression.
    #[arg(short = 'x', long = "exclude", value_name = "REGEXP")]
    pub exclude: Option<String>,

    /// Just run in the terminal instead of the clearing, interactive screen.
    #[arg(short = 't', long = "terminal")]
    pub terminal: bool,

    /// Enable verbose debugging output (on stderr).
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace). Overrides `-v`.
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Optional TOML file with watch / process / display defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to run, followed by its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// The log level implied by `--log-level` and `-v`, if any.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level),
            (None, true) => Some(LogLevel::Debug),
            (None, false) => None,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
