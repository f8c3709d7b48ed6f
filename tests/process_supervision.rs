// tests/process_supervision.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use simjob::config::ExecutableLocation;
use simjob::errors::WorkerError;
use simjob::exec::{CancelHandle, EngineCommand, EngineOutcome, launch, native_input_path};
use simjob::types::PathStyle;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn native_path_style_leaves_path_alone() {
    let p = Path::new("/data/work/run1.wxc");
    assert_eq!(
        native_input_path(p, PathStyle::Native),
        OsString::from("/data/work/run1.wxc")
    );
}

#[test]
fn windows_path_style_uses_backslashes() {
    let p = Path::new("/data/work/run1.wxc");
    assert_eq!(
        native_input_path(p, PathStyle::Windows),
        OsString::from("\\data\\work\\run1.wxc")
    );
}

#[test]
fn command_runs_from_executable_directory() -> TestResult {
    let location = ExecutableLocation::new("/opt/winxray/WinXRay.exe")?;
    let cmd = EngineCommand::for_input(
        &location,
        Path::new("/scratch/run1.wxc"),
        PathStyle::Native,
    );

    assert_eq!(cmd.program, PathBuf::from("/opt/winxray/WinXRay.exe"));
    assert_eq!(cmd.current_dir, PathBuf::from("/opt/winxray"));
    assert_eq!(
        cmd.argv(),
        vec![
            OsString::from("/opt/winxray/WinXRay.exe"),
            OsString::from("/scratch/run1.wxc"),
        ]
    );
    assert_eq!(cmd.display(), "/opt/winxray/WinXRay.exe /scratch/run1.wxc");
    Ok(())
}

#[tokio::test]
async fn missing_binary_is_launch_error() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let cmd = EngineCommand {
        program: tmp.path().join("no-such-engine"),
        args: vec![OsString::from("input.wxc")],
        current_dir: tmp.path().to_path_buf(),
    };

    match launch(&cmd) {
        Err(WorkerError::Launch { program, .. }) => assert_eq!(program, cmd.program),
        other => panic!("Expected Launch error, got: {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[test]
fn cancel_handle_is_idempotent() {
    let handle = CancelHandle::new();
    let token = handle.token();
    assert!(!token.is_cancelled());

    handle.cancel();
    handle.cancel();

    assert!(handle.is_cancelled());
    assert!(token.is_cancelled());
    assert!(handle.clone().token().is_cancelled());
}

#[cfg(unix)]
mod with_fake_engine {
    use super::*;
    use simjob_test_utils::fake_engine::{FakeEngine, read_invocation};

    fn command(engine: &Path, input: &Path) -> EngineCommand {
        EngineCommand {
            program: engine.to_path_buf(),
            args: vec![input.as_os_str().to_owned()],
            current_dir: engine.parent().unwrap().to_path_buf(),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_raised() -> TestResult {
        init_tracing();

        let tmp = tempfile::tempdir()?;
        let engine = FakeEngine::new()
            .stdout("progress 50%")
            .stderr("first problem")
            .stderr("fatal: no convergence")
            .exit_code(3)
            .install(&tmp.path().join("engine"))?;

        let mut process = launch(&command(&engine, &tmp.path().join("run1.wxc")))?;
        let report = with_timeout(process.wait(&mut CancelHandle::new().token())).await?;

        assert_eq!(report.outcome, EngineOutcome::Failed(3));
        assert_eq!(
            report.stderr_tail,
            vec!["first problem", "fatal: no convergence"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn successful_exit_and_invocation_context() -> TestResult {
        init_tracing();

        let tmp = tempfile::tempdir()?;
        let install_dir = tmp.path().join("engine");
        let engine = FakeEngine::new().install(&install_dir)?;
        let input = tmp.path().join("work").join("run1.wxc");

        let mut process = launch(&command(&engine, &input))?;
        assert!(process.id().is_some());
        let report = with_timeout(process.wait(&mut CancelHandle::new().token())).await?;

        assert_eq!(report.outcome, EngineOutcome::Success);
        assert!(report.stderr_tail.is_empty());

        let (cwd, arg) = read_invocation(&install_dir)?;
        assert_eq!(cwd, std::fs::canonicalize(&install_dir)?);
        assert_eq!(arg, input.to_string_lossy());
        Ok(())
    }

    #[tokio::test]
    async fn only_last_twenty_stderr_lines_are_kept() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let mut engine = FakeEngine::new();
        for i in 0..25 {
            engine = engine.stderr(&format!("line {i}"));
        }
        let engine = engine.exit_code(1).install(&tmp.path().join("engine"))?;

        let mut process = launch(&command(&engine, &tmp.path().join("x.in")))?;
        let report = with_timeout(process.wait(&mut CancelHandle::new().token())).await?;

        assert_eq!(report.stderr_tail.len(), 20);
        assert_eq!(report.stderr_tail.first().map(String::as_str), Some("line 5"));
        assert_eq!(report.stderr_tail.last().map(String::as_str), Some("line 24"));
        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_output_keeps_pipes_drained() -> TestResult {
        init_tracing();

        let tmp = tempfile::tempdir()?;
        // Latin-1 bytes on both streams, then more output once the readers
        // have seen them.
        let engine = FakeEngine::new()
            .runs(r"printf 'caf\351\n'")
            .runs(r"printf 'r\351sum\351\n' >&2")
            .runs("sleep 1")
            .stdout("more output")
            .stderr("after latin-1")
            .install(&tmp.path().join("engine"))?;

        let mut process = launch(&command(&engine, &tmp.path().join("x.in")))?;
        let report = with_timeout(process.wait(&mut CancelHandle::new().token())).await?;

        assert_eq!(report.outcome, EngineOutcome::Success);
        assert_eq!(
            report.stderr_tail,
            vec!["r\u{FFFD}sum\u{FFFD}", "after latin-1"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn cancel_token_kills_running_engine() -> TestResult {
        init_tracing();

        let tmp = tempfile::tempdir()?;
        let engine = FakeEngine::new()
            .sleeps(30)
            .install(&tmp.path().join("engine"))?;

        let cancel = CancelHandle::new();
        let mut token = cancel.token();
        let mut process = launch(&command(&engine, &tmp.path().join("x.in")))?;

        let started = Instant::now();
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                cancel.cancel();
            }
        });

        let report = with_timeout(process.wait(&mut token)).await?;

        assert_eq!(report.outcome, EngineOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
        Ok(())
    }

    #[tokio::test]
    async fn direct_cancel_then_wait_reports_cancelled() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let engine = FakeEngine::new()
            .sleeps(30)
            .install(&tmp.path().join("engine"))?;

        let mut process = launch(&command(&engine, &tmp.path().join("x.in")))?;
        process.cancel().await;
        process.cancel().await;

        let report = with_timeout(process.wait(&mut CancelHandle::new().token())).await?;
        assert_eq!(report.outcome, EngineOutcome::Cancelled);
        Ok(())
    }

    #[tokio::test]
    async fn token_cancelled_before_wait_stops_immediately() -> TestResult {
        let tmp = tempfile::tempdir()?;
        let engine = FakeEngine::new()
            .sleeps(30)
            .install(&tmp.path().join("engine"))?;

        let cancel = CancelHandle::new();
        cancel.cancel();

        let mut process = launch(&command(&engine, &tmp.path().join("x.in")))?;
        let started = Instant::now();
        let report = with_timeout(process.wait(&mut cancel.token())).await?;

        assert_eq!(report.outcome, EngineOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
        Ok(())
    }
}
