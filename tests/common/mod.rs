#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use simjob_test_utils::builders;
pub use simjob_test_utils::{init_tracing, with_timeout};

/// Scratch layout for one job: engine install dir, work dir, output dir.
pub struct JobDirs {
    pub engine: PathBuf,
    pub work: PathBuf,
    pub output: PathBuf,
}

impl JobDirs {
    pub fn create(root: &Path) -> std::io::Result<Self> {
        let dirs = Self {
            engine: root.join("engine"),
            work: root.join("work"),
            output: root.join("output"),
        };
        std::fs::create_dir_all(&dirs.engine)?;
        std::fs::create_dir_all(&dirs.work)?;
        std::fs::create_dir_all(&dirs.output)?;
        Ok(dirs)
    }
}
