// src/results.rs

//! Locating the engine's result directory inside a work directory.
//!
//! The engine drops one subdirectory per run into the work directory, named so
//! that the most recent run sorts last. The selection rule is kept in
//! [`select_result_dir`] so it can be tested without any filesystem.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, WorkerError};
use crate::fs::FileSystem;

/// Pick the result directory among candidate names: ascending byte-wise
/// lexicographic order, last entry wins. `None` if there are no candidates.
pub fn select_result_dir<I, S>(names: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
    names.sort();
    names.pop()
}

/// Names of the immediate subdirectories of `work_dir`, sorted ascending.
pub fn list_result_dirs(fs: &dyn FileSystem, work_dir: &Path) -> Result<Vec<String>> {
    let entries = fs
        .read_dir(work_dir)
        .map_err(|e| WorkerError::io(work_dir, e))?;

    let mut names: Vec<String> = entries
        .iter()
        .filter(|p| fs.is_dir(p))
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Return the full path of the result directory in `work_dir`.
///
/// Only directory existence is checked; the contents are left to the importer.
pub fn locate(fs: &dyn FileSystem, work_dir: &Path) -> Result<PathBuf> {
    let candidates = list_result_dirs(fs, work_dir)?;
    debug!(work_dir = ?work_dir, ?candidates, "result directory candidates");

    let chosen = select_result_dir(candidates)
        .ok_or_else(|| WorkerError::ResultsNotFound(work_dir.to_path_buf()))?;

    Ok(work_dir.join(chosen))
}
