//! Fake external engine: a generated `/bin/sh` script.
//!
//! The script receives the input file path as `$1` (native path style) and
//! treats the directory containing it as the work directory, the same way a
//! real engine writes its result folders next to its input file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File (inside the install directory) where the script records its working
/// directory on the first line and its first argument on the second.
pub const INVOCATION_LOG: &str = "invocation.log";

#[derive(Debug, Clone)]
enum Step {
    CreateDir(String),
    WriteFile(String, String),
    Stderr(String),
    Stdout(String),
    Shell(String),
}

/// Builder for a fake engine script.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    steps: Vec<Step>,
    sleep_secs: Option<u32>,
    exit_code: i32,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `<work_dir>/<name>` (in call order).
    pub fn creates_dir(mut self, name: &str) -> Self {
        self.steps.push(Step::CreateDir(name.to_string()));
        self
    }

    /// Write `contents` to `<work_dir>/<relative>`; parent must exist.
    pub fn writes_file(mut self, relative: &str, contents: &str) -> Self {
        self.steps
            .push(Step::WriteFile(relative.to_string(), contents.to_string()));
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.steps.push(Step::Stderr(line.to_string()));
        self
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.steps.push(Step::Stdout(line.to_string()));
        self
    }

    /// Append a raw shell line, e.g. `printf 'caf\351\n'` or `sleep 1`.
    pub fn runs(mut self, line: &str) -> Self {
        self.steps.push(Step::Shell(line.to_string()));
        self
    }

    /// Replace the shell with `sleep` after all other steps.
    pub fn sleeps(mut self, secs: u32) -> Self {
        self.sleep_secs = Some(secs);
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Render the script text for an engine installed in `install_dir`.
    pub fn script(&self, install_dir: &Path) -> String {
        let log = install_dir.join(INVOCATION_LOG);
        let mut s = String::from("#!/bin/sh\n");
        s.push_str(&format!(
            "printf '%s\\n' \"$(pwd -P)\" \"$1\" > {}\n",
            quote(&log.to_string_lossy())
        ));
        s.push_str("WORK_DIR=$(dirname \"$1\")\n");

        for step in &self.steps {
            let line = match step {
                Step::CreateDir(name) => format!("mkdir -p \"$WORK_DIR\"/{}", quote(name)),
                Step::WriteFile(rel, contents) => format!(
                    "printf '%s' {} > \"$WORK_DIR\"/{}",
                    quote(contents),
                    quote(rel)
                ),
                Step::Stderr(line) => format!("printf '%s\\n' {} >&2", quote(line)),
                Step::Stdout(line) => format!("printf '%s\\n' {}", quote(line)),
                Step::Shell(line) => line.clone(),
            };
            s.push_str(&line);
            s.push('\n');
        }

        if let Some(secs) = self.sleep_secs {
            s.push_str(&format!("exec sleep {secs}\n"));
        }
        s.push_str(&format!("exit {}\n", self.exit_code));
        s
    }

    /// Write the script as an executable `engine.sh` in `install_dir` and
    /// return its absolute path.
    pub fn install(&self, install_dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(install_dir)?;
        let install_dir = fs::canonicalize(install_dir)?;
        let path = install_dir.join("engine.sh");
        fs::write(&path, self.script(&install_dir))?;
        make_executable(&path)?;
        Ok(path)
    }
}

/// Working directory and first argument recorded by an installed fake engine.
pub fn read_invocation(install_dir: &Path) -> io::Result<(PathBuf, String)> {
    let text = fs::read_to_string(install_dir.join(INVOCATION_LOG))?;
    let mut lines = text.lines();
    let cwd = lines.next().unwrap_or_default();
    let arg = lines.next().unwrap_or_default();
    Ok((PathBuf::from(cwd), arg.to_string()))
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
