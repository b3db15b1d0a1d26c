#![allow(dead_code)]

use std::path::PathBuf;

use watchrun::config::Settings;
use watchrun::types::{CommandSpec, DisplayMode};
use watchrun::watch::ExcludeFilter;

/// Builder for `Settings` to simplify test setup.
///
/// Defaults: watch `.`, nothing excluded, run `echo hi`, terminal display.
pub struct SettingsBuilder {
    root: PathBuf,
    exclude: Option<String>,
    command: Vec<String>,
    display: DisplayMode,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            exclude: None,
            command: vec!["echo".to_string(), "hi".to_string()],
            display: DisplayMode::Terminal,
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.exclude = Some(pattern.to_string());
        self
    }

    pub fn command(mut self, argv: &[&str]) -> Self {
        self.command = argv.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    pub fn build(self) -> Settings {
        let exclude = match self.exclude.as_deref() {
            Some(pattern) => ExcludeFilter::new(pattern).expect("invalid exclude pattern"),
            None => ExcludeFilter::none(),
        };
        Settings {
            root: self.root,
            exclude,
            command: CommandSpec::from_argv(&self.command).expect("empty command"),
            display: self.display,
        }
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
