// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `simjob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "simjob",
    version,
    about = "Run one simulation job through an external engine and archive its output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the worker settings file (TOML).
    ///
    /// Default: `simjob.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Path to the job file (TOML) with `name` and `input`.
    #[arg(long, value_name = "PATH")]
    pub job: PathBuf,

    /// Directory receiving `<name>.zip`.
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Scratch directory for the input file and the engine's results.
    #[arg(long, value_name = "DIR")]
    pub work_dir: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SIMJOB_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load settings and job, print the command line, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
