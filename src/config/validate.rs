// src/config/validate.rs

use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::config::model::{RawConfigFile, Settings};
use crate::errors::{Result, WatchrunError};
use crate::types::{CommandSpec, DisplayMode};
use crate::watch::ExcludeFilter;

/// Merge command-line flags over the (optional) config file and check the
/// result.
pub fn resolve_settings(args: &CliArgs, file: Option<RawConfigFile>) -> Result<Settings> {
    let file = file.unwrap_or_default();

    let command = CommandSpec::from_argv(&args.command)
        .ok_or_else(|| WatchrunError::Usage("missing command to run".to_string()))?;
    if command.program.trim().is_empty() {
        return Err(WatchrunError::Usage("command must not be empty".to_string()));
    }

    let root = args
        .path
        .clone()
        .or(file.watch.path)
        .unwrap_or_else(|| PathBuf::from("."));

    let exclude = match args.exclude.as_deref().or(file.watch.exclude.as_deref()) {
        Some(pattern) => ExcludeFilter::new(pattern)?,
        None => ExcludeFilter::none(),
    };

    let display = if args.terminal {
        DisplayMode::Terminal
    } else {
        file.display.mode.unwrap_or_default()
    };

    Ok(Settings {
        root,
        exclude,
        command,
        display,
    })
}
