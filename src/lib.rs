// src/lib.rs

pub mod adapter;
pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod results;
pub mod types;
pub mod worker;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapter::{TemplateAdapter, TemplateJob};
use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::worker::JobWorker;

pub use crate::errors::{JobError, JobStep, WorkerError};
pub use crate::types::WorkerStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings and job loading
/// - the job worker with the template adapter
/// - Ctrl-C handling (cancels the running engine)
/// - printing the result manifest
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_and_validate(&args.config)
        .with_context(|| format!("loading settings from {:?}", args.config))?;
    let job = TemplateJob::load(&args.job)
        .with_context(|| format!("loading job from {:?}", args.job))?;

    let mut worker = JobWorker::new(TemplateAdapter, settings);

    if args.dry_run {
        print_dry_run(&job, &args, &worker);
        return Ok(());
    }

    // Ctrl-C → cancel the engine; the run then ends as cancelled.
    {
        let cancel = worker.cancel_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    info!(job = %job.name, work_dir = ?args.work_dir, output_dir = ?args.output_dir, "starting job");
    let manifest = worker.run(&job, &args.output_dir, &args.work_dir).await?;

    let rendered = toml::to_string_pretty(&manifest).context("rendering result manifest")?;
    print!("{rendered}");
    Ok(())
}

/// Simple dry-run output: resolved settings, job and command line.
fn print_dry_run(job: &TemplateJob, args: &CliArgs, worker: &JobWorker<TemplateAdapter>) {
    println!("simjob dry-run");
    println!("  engine.executable = {:?}", worker.location().executable());
    println!("  engine.directory = {:?}", worker.location().directory());
    println!("  engine.path_style = {:?}", worker.path_style());
    println!(
        "  platform.supports_direct_invocation = {}",
        worker.platform().supports_direct_invocation
    );
    println!("  archive.recursive = {}", worker.archive_options().recursive);
    println!();

    println!("job {}:", job.name);
    println!("  input: {:?}", job.input);
    println!("  work_dir: {:?}", args.work_dir);
    println!(
        "  archive: {:?}",
        args.output_dir.join(format!("{}.zip", job.name))
    );

    let artifact = args.work_dir.join(job.artifact_name());
    println!("  command: {}", worker.command_for(&artifact).display());

    debug!("dry-run complete (no execution)");
}
