// src/cli.rs

//! CLI argument parsing using `clap`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::exec::LaunchSpec;

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Run a binary and restart it whenever the executable changes on disk.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional config file (TOML) with `[supervise]` and `[backoff]` sections.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not start the binary until it changes for the first time.
    #[arg(long)]
    pub wait_for_change: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The binary to supervise, followed by its arguments.
    ///
    /// Everything after the binary name is passed through untouched.
    #[arg(
        value_name = "BINARY [ARGS]",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    pub command: Vec<OsString>,
}

impl CliArgs {
    pub fn launch_spec(&self) -> Option<LaunchSpec> {
        let (binary, args) = self.command.split_first()?;
        Some(LaunchSpec::new(binary.clone(), args.iter().cloned()))
    }
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
