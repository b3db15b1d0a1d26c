// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the `-x` exclusion regexp.
//! - Registering every directory of the watched tree with a non-recursive
//!   `notify` watcher, and new directories as they appear.
//! - Normalizing raw notifications into timestamped changes.
//!
//! It does **not** decide when to run anything; it only turns filesystem
//! activity into `RuntimeEvent::Changed`.

pub mod exclude;
pub mod normalizer;
pub mod registry;
pub mod watcher;

pub use exclude::ExcludeFilter;
pub use normalizer::{resolve_mod_time, EventNormalizer};
pub use registry::{NotifyBackend, WatchBackend, WatchRegistry};
pub use watcher::{forward_events, spawn_watcher, WatcherHandle};
