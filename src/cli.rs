// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `espsync`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "espsync",
    version,
    about = "Keep mirror copies of EFI system partitions in sync with the booted one.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long = "conf", value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Sync every configured source once, wait for completion and exit.
    #[arg(long)]
    pub sync: bool,

    /// Run as a daemon: sync everything once, then watch the sources and
    /// sync again whenever they change.
    #[arg(long)]
    pub syncd: bool,

    /// Pass dry-run flags to the copy tool; nothing is written.
    #[arg(long)]
    pub test: bool,

    /// Only log warnings and errors unless `--log-level` says otherwise.
    #[arg(long, short)]
    pub quiet: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ESPSYNC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the copy commands without running them.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn mode(&self) -> Mode {
        if self.syncd {
            Mode::Daemon
        } else if self.sync {
            Mode::Once
        } else {
            Mode::List
        }
    }
}

/// What the process does after the config has been validated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print the job list.
    List,
    /// One forced sync of every job.
    Once,
    /// Initial sync, then watch until signalled.
    Daemon,
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
