// src/config/mod.rs

//! Configuration loading and validation for watchrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the merged `Settings` (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Merge it with the command line and validate (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, load_settings};
pub use model::{DisplaySection, RawConfigFile, Settings, WatchSection};
pub use validate::resolve_settings;
