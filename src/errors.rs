// src/errors.rs

//! Crate-wide error types.
//!
//! Each component raises only its own variant of [`WorkerError`]. The job
//! worker never translates them; it only wraps them in a [`JobError`] that
//! records which step of the run failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error produced by an external collaborator (create/import).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to launch external engine {program:?}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for external engine: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create engine input file: {source}")]
    Create {
        #[source]
        source: CollaboratorError,
    },

    #[error("failed to import results from {path:?}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: CollaboratorError,
    },

    #[error("cannot find results directories in {0:?}")]
    ResultsNotFound(PathBuf),

    #[error("failed to write archive {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error(
        "simulations cannot be run directly on this platform; \
         the input file was created at {artifact:?}"
    )]
    NotSupportedOnPlatform { artifact: PathBuf },

    #[error("job cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WorkerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkerError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Step of a job run, attached to every failure of [`crate::worker::JobWorker::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStep {
    Create,
    Launch,
    RunExternal,
    LocateResults,
    Import,
    Archive,
}

impl fmt::Display for JobStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStep::Create => "create",
            JobStep::Launch => "launch",
            JobStep::RunExternal => "run-external",
            JobStep::LocateResults => "locate-results",
            JobStep::Import => "import",
            JobStep::Archive => "archive",
        };
        f.write_str(s)
    }
}

/// A failed job run: the originating error, unchanged, plus the step it came from.
#[derive(Error, Debug)]
#[error("job failed during {step} step: {source}")]
pub struct JobError {
    pub step: JobStep,
    #[source]
    pub source: WorkerError,
}

impl JobError {
    pub fn new(step: JobStep, source: WorkerError) -> Self {
        Self { step, source }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, WorkerError::Cancelled)
    }
}
