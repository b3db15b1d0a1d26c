// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the command, using
//! `tokio::process::Command`, and reporting back to the coordination runtime
//! via `RuntimeEvent`s.
//!
//! - [`launcher`] spawns the child (in its own process group where the
//!   platform has them) and delivers termination signals.
//! - [`task_runner`] copies a run's output live, applies termination
//!   requests and reaps the process.
//! - [`output`] frames each run: command line, status, timestamp.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod launcher;
pub mod output;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use launcher::{platform_launcher, ProcessLauncher, RunHandle};
