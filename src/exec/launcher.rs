// src/exec/launcher.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ExecutableLocation;
use crate::errors::{Result, WorkerError};
use crate::types::PathStyle;

use super::supervisor::ProcessHandle;

/// Structured command line for one engine invocation.
///
/// The engine is always started from its own install directory, because it
/// resolves auxiliary files relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: PathBuf,
}

impl EngineCommand {
    /// `[executable, input]`, run from the executable's directory.
    pub fn for_input(location: &ExecutableLocation, input: &Path, style: PathStyle) -> Self {
        Self {
            program: location.executable().to_path_buf(),
            args: vec![native_input_path(input, style)],
            current_dir: location.directory().to_path_buf(),
        }
    }

    /// Full argument vector, program first.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone().into_os_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Space-joined rendering for logs and dry runs.
    pub fn display(&self) -> String {
        self.argv()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Render `input` the way the engine expects to read it.
pub fn native_input_path(input: &Path, style: PathStyle) -> OsString {
    match style {
        PathStyle::Native => input.as_os_str().to_owned(),
        PathStyle::Windows => input.to_string_lossy().replace('/', "\\").into(),
    }
}

/// Start the engine. Returns as soon as the child exists.
///
/// stdout and stderr are piped and drained in the background by the
/// returned handle. Must be called from within a Tokio runtime.
pub fn launch(command: &EngineCommand) -> Result<ProcessHandle> {
    info!(command = %command.display(), cwd = ?command.current_dir, "launching external engine");

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.current_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|source| WorkerError::Launch {
        program: command.program.clone(),
        source,
    })?;

    debug!(pid = ?child.id(), "external engine started");
    Ok(ProcessHandle::new(command.program.clone(), child))
}
