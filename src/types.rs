// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the input file path is written on the engine's command line.
///
/// - `Native`: pass the path exactly as the host OS spells it.
/// - `Windows`: rewrite every `/` into `\`, for engines that only understand
///   Windows paths (e.g. a Windows binary run through a compatibility layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    Native,
    Windows,
}

impl Default for PathStyle {
    fn default() -> Self {
        PathStyle::Native
    }
}

impl FromStr for PathStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(PathStyle::Native),
            "windows" => Ok(PathStyle::Windows),
            other => Err(format!(
                "invalid path_style: {other} (expected \"native\" or \"windows\")"
            )),
        }
    }
}

/// Observable lifecycle status of a [`crate::worker::JobWorker`].
///
/// `Done`, `Failed` and `Cancelled` are terminal for a run; the next run
/// resets the status to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Creating,
    Launching,
    RunningExternal,
    LocatingResults,
    Importing,
    Archiving,
    Done,
    Failed,
    Cancelled,
}

impl WorkerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkerStatus::Done | WorkerStatus::Failed | WorkerStatus::Cancelled
        )
    }
}

impl Default for WorkerStatus {
    fn default() -> Self {
        WorkerStatus::Idle
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerStatus::Idle => "idle",
            WorkerStatus::Creating => "creating input file",
            WorkerStatus::Launching => "launching",
            WorkerStatus::RunningExternal => "running external engine",
            WorkerStatus::LocatingResults => "extracting results",
            WorkerStatus::Importing => "importing results",
            WorkerStatus::Archiving => "archiving",
            WorkerStatus::Done => "done",
            WorkerStatus::Failed => "failed",
            WorkerStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}
