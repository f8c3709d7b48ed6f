// src/config/location.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, WorkerError};

/// Absolute path of the engine binary plus the directory containing it.
///
/// The directory is used as the working directory of every engine process.
/// Whether the binary exists and is executable is left to the OS at launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableLocation {
    executable: PathBuf,
    directory: PathBuf,
}

impl ExecutableLocation {
    pub fn new(executable: impl Into<PathBuf>) -> Result<Self> {
        let executable = executable.into();

        if !executable.is_absolute() {
            return Err(WorkerError::Config(format!(
                "engine executable must be an absolute path (got {:?})",
                executable
            )));
        }

        let directory = match executable.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && executable.file_name().is_some() => {
                dir.to_path_buf()
            }
            _ => {
                return Err(WorkerError::Config(format!(
                    "engine executable {:?} has no containing directory",
                    executable
                )));
            }
        };

        debug!(executable = ?executable, "engine executable");
        debug!(directory = ?directory, "engine directory");

        Ok(Self {
            executable,
            directory,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
