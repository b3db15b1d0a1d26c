// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::RuntimeOptions;
use crate::types::{CommandSpec, DisplayMode};
use crate::watch::ExcludeFilter;

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [watch]
/// path = "."
/// exclude = "\\.git"
///
/// [display]
/// mode = "screen"
/// ```
///
/// All sections and keys are optional; command-line flags win over them.
/// The quiescence and grace windows are fixed and cannot be set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub display: DisplaySection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    pub path: Option<PathBuf>,
    pub exclude: Option<String>,
}

/// `[display]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplaySection {
    pub mode: Option<DisplayMode>,
}

/// Validated settings: CLI flags merged over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub root: PathBuf,
    pub exclude: ExcludeFilter,
    pub command: CommandSpec,
    pub display: DisplayMode,
}

impl Settings {
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions::default()
    }
}
