// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::errors::{Result, WorkerError};

/// Environment variable that, when set, replaces `engine.executable`.
pub const ENGINE_EXE_ENV: &str = "SIMJOB_ENGINE_EXE";

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; it does **not** resolve or
/// validate anything. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| WorkerError::io(path, e))?;

    let settings: RawSettings = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file, apply the `SIMJOB_ENGINE_EXE` override and validate.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let mut raw = load_from_path(&path)?;

    if let Some(exe) = std::env::var_os(ENGINE_EXE_ENV).filter(|v| !v.is_empty()) {
        debug!(executable = ?exe, "engine executable overridden from {}", ENGINE_EXE_ENV);
        raw.engine.executable = PathBuf::from(exe);
    }

    Settings::try_from(raw)
}

/// Default settings path: `simjob.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("simjob.toml")
}
