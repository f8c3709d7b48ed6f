// src/exec/supervisor.rs

//! Supervision of a running engine process.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, WorkerError};

/// Number of trailing stderr lines kept for diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// How long to wait for the output readers after the child exits. A
/// grandchild that inherited the pipes can keep them open indefinitely.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// How the engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    Success,
    /// Non-zero exit code, or -1 when terminated by a signal.
    Failed(i32),
    /// Killed on request.
    Cancelled,
}

/// What the supervisor reports once the engine is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub outcome: EngineOutcome,
    /// Last lines the engine wrote to stderr (at most 20).
    pub stderr_tail: Vec<String>,
}

/// Requests cancellation of a job. Cheap to clone and usable from any task.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation. Repeated calls are no-ops.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Clear a previous request so the next job starts uncancelled.
    pub(crate) fn reset(&self) {
        self.tx.send_replace(false);
    }
}

/// Receiving side of a [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if every
    /// handle has been dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Exclusive owner of one engine child process.
#[derive(Debug)]
pub struct ProcessHandle {
    program: PathBuf,
    child: Child,
    stdout_reader: Option<JoinHandle<Vec<String>>>,
    stderr_reader: Option<JoinHandle<Vec<String>>>,
    cancelled: bool,
}

impl ProcessHandle {
    pub(crate) fn new(program: PathBuf, mut child: Child) -> Self {
        let stdout_reader = child.stdout.take().map(|out| spawn_line_reader(out, "stdout"));
        let stderr_reader = child.stderr.take().map(|err| spawn_line_reader(err, "stderr"));

        Self {
            program,
            child,
            stdout_reader,
            stderr_reader,
            cancelled: false,
        }
    }

    /// OS process id, while the child has not been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the child. Best effort; calling it again does nothing.
    pub async fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;

        info!(program = ?self.program, pid = ?self.child.id(), "killing external engine");
        if let Err(e) = self.child.kill().await {
            warn!(
                program = ?self.program,
                error = %e,
                "failed to kill external engine"
            );
        }
    }

    /// Block until the engine exits or `cancel` fires.
    ///
    /// A non-zero exit code is reported in the [`ExitReport`], not as an
    /// error. Only a failure of the OS wait itself is an error.
    pub async fn wait(&mut self, cancel: &mut CancelToken) -> Result<ExitReport> {
        if !self.cancelled {
            tokio::select! {
                status = self.child.wait() => {
                    let status = status.map_err(|source| WorkerError::Wait { source })?;
                    let outcome = if status.success() {
                        EngineOutcome::Success
                    } else {
                        EngineOutcome::Failed(status.code().unwrap_or(-1))
                    };
                    return Ok(self.finish(outcome).await);
                }
                _ = cancel.cancelled() => {
                    info!(program = ?self.program, "cancellation requested while engine running");
                    self.cancel().await;
                }
            }
        }

        Ok(self.finish(EngineOutcome::Cancelled).await)
    }

    async fn finish(&mut self, outcome: EngineOutcome) -> ExitReport {
        if let Some(reader) = self.stdout_reader.take() {
            collect_lines(reader).await;
        }
        let stderr_tail = match self.stderr_reader.take() {
            Some(reader) => collect_lines(reader).await,
            None => Vec::new(),
        };

        match outcome {
            EngineOutcome::Failed(code) => {
                warn!(
                    program = ?self.program,
                    exit_code = code,
                    stderr = %stderr_tail.join("\n"),
                    "external engine exited unsuccessfully"
                );
            }
            _ => {
                info!(program = ?self.program, ?outcome, "external engine ended");
            }
        }

        ExitReport {
            outcome,
            stderr_tail,
        }
    }
}

/// Log every line of `stream` at debug and keep the last few.
///
/// Lines are decoded lossily and the stream is read to EOF whatever it
/// contains; closing the pipe early would kill the engine with SIGPIPE.
fn spawn_line_reader<R>(stream: R, name: &'static str) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(stream = name, error = %e, "engine output read failed");
                    break;
                }
            }

            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            debug!(stream = name, "engine: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }

        tail.into_iter().collect()
    })
}

async fn collect_lines(mut reader: JoinHandle<Vec<String>>) -> Vec<String> {
    match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut reader).await {
        Ok(Ok(lines)) => lines,
        Ok(Err(e)) => {
            debug!(error = %e, "output reader task failed");
            Vec::new()
        }
        Err(_) => {
            debug!("output still open after engine exit; abandoning reader");
            reader.abort();
            Vec::new()
        }
    }
}
