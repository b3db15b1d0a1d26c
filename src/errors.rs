// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::RunId;

#[derive(Error, Debug)]
pub enum WatchrunError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Bad exclusion regexp: {0}")]
    InvalidExclude(#[from] regex::Error),

    #[error("Failed to initialise file watching: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error reaping run {run}: {message}")]
    Reap { run: RunId, message: String },

    #[error("Failed to find an existing ancestor for {0:?}")]
    Resolution(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, WatchrunError>;
