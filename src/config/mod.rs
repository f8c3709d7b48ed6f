// src/config/mod.rs

//! Worker settings: where the engine lives and how to drive it.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate it into resolved [`Settings`] (`validate.rs`).
//! - Hold the resolved engine location (`location.rs`).

pub mod loader;
pub mod location;
pub mod model;
pub mod validate;

pub use loader::{ENGINE_EXE_ENV, default_config_path, load_and_validate, load_from_path};
pub use location::ExecutableLocation;
pub use model::{ArchiveSection, EngineSection, RawSettings, Settings};
