// src/adapter.rs

//! The collaborators that know the engine's file formats.
//!
//! The worker never reads or writes engine files itself. It calls
//! [`EngineAdapter::create`] to produce the native input file and
//! [`EngineAdapter::import`] to turn a result directory into the caller's
//! result type.
//!
//! [`TemplateAdapter`] is the adapter used by the `simjob` binary: the job
//! points at an input file prepared elsewhere, and the imported result is a
//! listing of the files the engine produced.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::errors::WorkerError;

/// A job configuration. Opaque to the worker except for its name, which is
/// used to name output files and must therefore be filesystem-safe.
pub trait JobConfig {
    fn name(&self) -> &str;
}

/// Create and import steps for one kind of engine.
pub trait EngineAdapter: Send + Sync {
    type Job: JobConfig + Send + Sync;
    type Results: Send;

    /// Write the engine's native input file for `job` into `work_dir` and
    /// return its path.
    fn create(&self, job: &Self::Job, work_dir: &Path) -> Result<PathBuf>;

    /// Build the results of `job` from the engine's output in `result_dir`.
    fn import(&self, job: &Self::Job, result_dir: &Path) -> Result<Self::Results>;
}

/// Reject names that would escape or confuse the output directory.
pub fn validate_job_name(name: &str) -> std::result::Result<(), WorkerError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');

    if bad {
        return Err(WorkerError::Config(format!(
            "job name {:?} is not a valid file name",
            name
        )));
    }
    Ok(())
}

/// Job description read by the `simjob` binary.
///
/// ```toml
/// name = "run1"
/// input = "prepared/run1.wxc"
/// extension = "wxc"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateJob {
    pub name: String,

    /// Prepared engine input file.
    pub input: PathBuf,

    /// Extension of the file written into the work directory. Defaults to
    /// the extension of `input`.
    #[serde(default)]
    pub extension: Option<String>,
}

impl TemplateJob {
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, WorkerError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| WorkerError::io(path, e))?;
        let job: TemplateJob = toml::from_str(&contents)?;
        validate_job_name(&job.name)?;
        Ok(job)
    }

    /// File name of the input file written into the work directory.
    pub fn artifact_name(&self) -> String {
        let ext = self
            .extension
            .clone()
            .or_else(|| {
                self.input
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
            });
        match ext {
            Some(ext) if !ext.is_empty() => format!("{}.{}", self.name, ext),
            _ => self.name.clone(),
        }
    }
}

impl JobConfig for TemplateJob {
    fn name(&self) -> &str {
        &self.name
    }
}

/// One file found in a result directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Path relative to the result directory, `/`-separated.
    pub path: String,
    pub size: u64,
}

/// Listing of an engine result directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultManifest {
    pub job: String,
    pub result_dir: PathBuf,
    pub files: Vec<ManifestEntry>,
}

/// Adapter that copies a prepared input file and lists the produced files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAdapter;

impl EngineAdapter for TemplateAdapter {
    type Job = TemplateJob;
    type Results = ResultManifest;

    fn create(&self, job: &TemplateJob, work_dir: &Path) -> Result<PathBuf> {
        if !job.input.is_file() {
            bail!("input file {:?} of job '{}' does not exist", job.input, job.name);
        }

        fs::create_dir_all(work_dir)
            .with_context(|| format!("creating work directory {:?}", work_dir))?;

        let artifact = work_dir.join(job.artifact_name());
        fs::copy(&job.input, &artifact)
            .with_context(|| format!("copying {:?} to {:?}", job.input, artifact))?;

        Ok(artifact)
    }

    fn import(&self, job: &TemplateJob, result_dir: &Path) -> Result<ResultManifest> {
        let mut files = Vec::new();
        collect_files(result_dir, "", &mut files)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(ResultManifest {
            job: job.name.clone(),
            result_dir: result_dir.to_path_buf(),
            files,
        })
    }
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<ManifestEntry>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading dir {:?}", dir))?;

    for entry in entries {
        let entry = entry?;
        let name = format!("{prefix}{}", entry.file_name().to_string_lossy());
        let metadata = entry
            .metadata()
            .with_context(|| format!("reading metadata of {:?}", entry.path()))?;

        if metadata.is_dir() {
            collect_files(&entry.path(), &format!("{name}/"), out)?;
        } else {
            out.push(ManifestEntry {
                path: name,
                size: metadata.len(),
            });
        }
    }
    Ok(())
}
