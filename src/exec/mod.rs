// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the external engine,
//! using `tokio::process::Command`.
//!
//! - [`launcher`] builds the engine's argument vector and spawns the child.
//! - [`supervisor`] owns the running child: waiting, cancellation, and the
//!   exit report handed back to the worker.

pub mod launcher;
pub mod supervisor;

pub use launcher::{EngineCommand, launch, native_input_path};
pub use supervisor::{CancelHandle, CancelToken, EngineOutcome, ExitReport, ProcessHandle};
