// src/worker/mod.rs

//! The job worker: one simulation run from input file to archived results.
//!
//! A run walks through
//! `Idle → Creating → Launching → RunningExternal → LocatingResults →
//! Importing → Archiving → Done`, ending in `Failed` or `Cancelled` instead
//! when a step does not complete. Steps never overlap and nothing is retried.
//!
//! The engine's exit code is logged but not trusted: a run succeeds when a
//! result directory exists afterwards. A crashed engine can therefore be
//! masked by a stale result directory left over from an earlier run in the
//! same work directory; callers should hand every run a fresh work directory.

pub mod platform;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::adapter::{EngineAdapter, JobConfig, validate_job_name};
use crate::archive::{self, ArchiveOptions};
use crate::config::{ExecutableLocation, Settings};
use crate::errors::{JobError, JobStep, Result, WorkerError};
use crate::exec::{CancelHandle, EngineCommand, EngineOutcome, launch};
use crate::fs::{FileSystem, RealFileSystem};
use crate::results;
use crate::types::{PathStyle, WorkerStatus};

pub use platform::Platform;

type StepResult<T> = std::result::Result<T, JobError>;

/// Runs jobs for one engine installation, one job at a time.
///
/// `run` takes `&mut self`, so a worker can never run two jobs at once.
/// Observers use [`JobWorker::subscribe`] and [`JobWorker::cancel_handle`],
/// which can be cloned into other tasks before the run starts.
pub struct JobWorker<A: EngineAdapter> {
    adapter: A,
    location: ExecutableLocation,
    path_style: PathStyle,
    platform: Platform,
    archive: ArchiveOptions,
    fs: Arc<dyn FileSystem>,
    status: watch::Sender<WorkerStatus>,
    cancel: CancelHandle,
}

impl<A: EngineAdapter> JobWorker<A> {
    pub fn new(adapter: A, settings: Settings) -> Self {
        let (status, _rx) = watch::channel(WorkerStatus::Idle);

        info!(
            executable = ?settings.location.executable(),
            directory = ?settings.location.directory(),
            direct_invocation = settings.platform.supports_direct_invocation,
            "job worker ready"
        );

        Self {
            adapter,
            location: settings.location,
            path_style: settings.path_style,
            platform: settings.platform,
            archive: settings.archive,
            fs: Arc::new(RealFileSystem),
            status,
            cancel: CancelHandle::new(),
        }
    }

    /// Replace the filesystem used to locate and archive results.
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn location(&self) -> &ExecutableLocation {
        &self.location
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn path_style(&self) -> PathStyle {
        self.path_style
    }

    pub fn archive_options(&self) -> ArchiveOptions {
        self.archive
    }

    pub fn status(&self) -> WorkerStatus {
        *self.status.borrow()
    }

    /// Watch status changes while a run is in progress.
    pub fn subscribe(&self) -> watch::Receiver<WorkerStatus> {
        self.status.subscribe()
    }

    /// Handle for cancelling the current run, or the next one if no run is
    /// active. A request is consumed when the run it applied to ends.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Command line that would be used for an input file at `artifact`.
    pub fn command_for(&self, artifact: &Path) -> EngineCommand {
        EngineCommand::for_input(&self.location, artifact, self.path_style)
    }

    /// Run one job to completion.
    ///
    /// Creates the input file in `work_dir`, runs the engine, imports the
    /// lexicographically last result directory and archives `work_dir` to
    /// `output_dir/<name>.zip`. On failure `work_dir` is left as it is and the
    /// archive, if present, must be treated as invalid. `output_dir` must
    /// not be `work_dir` or lie inside it.
    pub async fn run(
        &mut self,
        job: &A::Job,
        output_dir: &Path,
        work_dir: &Path,
    ) -> StepResult<A::Results> {
        self.set_status(WorkerStatus::Idle);

        let result = self.run_steps(job, output_dir, work_dir).await;

        match &result {
            Ok(_) => {
                self.set_status(WorkerStatus::Done);
                info!(job = %job.name(), "job done");
            }
            Err(err) if err.is_cancelled() => {
                self.set_status(WorkerStatus::Cancelled);
                warn!(job = %job.name(), step = %err.step, "job cancelled");
            }
            Err(err) => {
                self.set_status(WorkerStatus::Failed);
                error!(job = %job.name(), step = %err.step, error = %err.source, "job failed");
            }
        }

        self.cancel.reset();
        result
    }

    async fn run_steps(
        &mut self,
        job: &A::Job,
        output_dir: &Path,
        work_dir: &Path,
    ) -> StepResult<A::Results> {
        let name = job.name();
        validate_job_name(name).map_err(|e| JobError::new(JobStep::Create, e))?;
        check_output_outside_work(output_dir, work_dir)
            .map_err(|e| JobError::new(JobStep::Create, e))?;

        self.set_status(WorkerStatus::Creating);
        let artifact = self
            .adapter
            .create(job, work_dir)
            .map_err(|e| JobError::new(JobStep::Create, WorkerError::Create { source: e.into() }))?;
        info!(job = %name, artifact = ?artifact, "input file created");

        if !self.platform.supports_direct_invocation {
            return Err(JobError::new(
                JobStep::Create,
                WorkerError::NotSupportedOnPlatform { artifact },
            ));
        }

        if self.cancel.is_cancelled() {
            return Err(JobError::new(JobStep::Launch, WorkerError::Cancelled));
        }

        self.set_status(WorkerStatus::Launching);
        // The engine runs from its own directory, so relative paths would
        // resolve against the wrong place.
        let artifact = std::path::absolute(&artifact)
            .map_err(|e| JobError::new(JobStep::Launch, WorkerError::io(&artifact, e)))?;
        let command = self.command_for(&artifact);
        let mut process = launch(&command).map_err(|e| JobError::new(JobStep::Launch, e))?;

        self.set_status(WorkerStatus::RunningExternal);
        let mut token = self.cancel.token();
        let report = process
            .wait(&mut token)
            .await
            .map_err(|e| JobError::new(JobStep::RunExternal, e))?;

        if report.outcome == EngineOutcome::Cancelled {
            return Err(JobError::new(JobStep::RunExternal, WorkerError::Cancelled));
        }

        self.set_status(WorkerStatus::LocatingResults);
        let result_dir = match results::locate(self.fs.as_ref(), work_dir) {
            Ok(dir) => dir,
            Err(e) => {
                error!(
                    job = %name,
                    outcome = ?report.outcome,
                    stderr = %report.stderr_tail.join("\n"),
                    "no result directory after engine run"
                );
                return Err(JobError::new(JobStep::LocateResults, e));
            }
        };

        if let EngineOutcome::Failed(code) = report.outcome {
            warn!(
                job = %name,
                exit_code = code,
                result_dir = ?result_dir,
                "engine exited unsuccessfully but a result directory exists; continuing"
            );
        }

        self.set_status(WorkerStatus::Importing);
        info!(job = %name, result_dir = ?result_dir, "importing results");
        let results = self.adapter.import(job, &result_dir).map_err(|e| {
            JobError::new(
                JobStep::Import,
                WorkerError::Import {
                    path: result_dir.clone(),
                    source: e.into(),
                },
            )
        })?;

        self.set_status(WorkerStatus::Archiving);
        let archive_path = output_dir.join(format!("{name}.zip"));
        archive::archive_dir(self.fs.as_ref(), work_dir, &archive_path, self.archive)
            .map_err(|e| JobError::new(JobStep::Archive, e))?;

        Ok(results)
    }

    fn set_status(&self, status: WorkerStatus) {
        self.status.send_replace(status);
    }
}

/// The archive must not be written into the tree it is made from.
fn check_output_outside_work(output_dir: &Path, work_dir: &Path) -> Result<()> {
    let output = resolve(output_dir)?;
    let work = resolve(work_dir)?;

    if output.starts_with(&work) {
        return Err(WorkerError::Config(format!(
            "output directory {:?} must not be inside work directory {:?}",
            output_dir, work_dir
        )));
    }
    Ok(())
}

/// Canonical path when it exists. A missing directory is resolved through
/// its parent, so symlinked temp roots compare equal.
fn resolve(path: &Path) -> Result<PathBuf> {
    if let Ok(p) = std::fs::canonicalize(path) {
        return Ok(p);
    }
    let absolute = std::path::absolute(path).map_err(|e| WorkerError::io(path, e))?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match std::fs::canonicalize(parent) {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(absolute),
        },
        _ => Ok(absolute),
    }
}
