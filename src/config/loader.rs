// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{RawConfigFile, Settings};
use crate::config::validate::resolve_settings;
use crate::errors::{Result, WatchrunError};

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; merging with the command line
/// and semantic checks happen in [`resolve_settings`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| {
        WatchrunError::Config(format!("cannot read {}: {err}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = ?path, ?config, "loaded config file");

    Ok(config)
}

/// Build the effective settings for a run of the program.
///
/// The config file is only read when `--config` was given.
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => Some(load_from_path(path)?),
        None => None,
    };
    resolve_settings(args, file)
}
