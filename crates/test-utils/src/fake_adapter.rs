use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use simjob::adapter::{EngineAdapter, JobConfig};

/// Minimal job: just a name.
#[derive(Debug, Clone)]
pub struct FakeJob {
    pub name: String,
}

impl FakeJob {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl JobConfig for FakeJob {
    fn name(&self) -> &str {
        &self.name
    }
}

/// What the fake importer returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedResult {
    pub job: String,
    pub result_dir: PathBuf,
    /// Sorted file names directly inside `result_dir`.
    pub files: Vec<String>,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

/// A fake adapter that:
/// - writes `<name>.in` into the work directory on create
/// - lists the result directory on import
/// - records every call as `"create:<name>"` / `"import:<dir name>"`.
#[derive(Clone, Default)]
pub struct RecordingAdapter {
    calls: Arc<Mutex<Vec<String>>>,
    on_create: Option<Hook>,
    fail_import: bool,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `hook` at the end of every create call.
    pub fn on_create(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_create = Some(Arc::new(hook));
        self
    }

    pub fn failing_import(mut self) -> Self {
        self.fail_import = true;
        self
    }

    /// Shared view of the recorded calls.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl EngineAdapter for RecordingAdapter {
    type Job = FakeJob;
    type Results = ImportedResult;

    fn create(&self, job: &FakeJob, work_dir: &Path) -> Result<PathBuf> {
        self.record(format!("create:{}", job.name));

        fs::create_dir_all(work_dir)?;
        let artifact = work_dir.join(format!("{}.in", job.name));
        fs::write(&artifact, format!("job = {}\n", job.name))
            .with_context(|| format!("writing {:?}", artifact))?;

        if let Some(hook) = &self.on_create {
            hook();
        }
        Ok(artifact)
    }

    fn import(&self, job: &FakeJob, result_dir: &Path) -> Result<ImportedResult> {
        let dir_name = result_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(format!("import:{dir_name}"));

        if self.fail_import {
            bail!("unreadable results in {:?}", result_dir);
        }

        let mut files: Vec<String> = fs::read_dir(result_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();

        Ok(ImportedResult {
            job: job.name.clone(),
            result_dir: result_dir.to_path_buf(),
            files,
        })
    }
}
