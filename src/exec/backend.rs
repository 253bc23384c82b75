// src/exec/backend.rs

//! Pluggable copy backend abstraction.
//!
//! A [`crate::sync::SyncJob`] talks to a `CopyBackend` instead of spawning
//! the copy tool itself. Production code uses [`ProcessCopyBackend`], which
//! runs the external copy tool once per destination; tests provide a fake
//! that records requests and simulates copy duration.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tracing::{debug, info};

use crate::exec::command::CopySettings;
use crate::types::JobId;

/// One `source/ -> destination/` transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub job: JobId,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub exclusions: Vec<String>,
}

/// Result of one transfer. Failures are values; they never abort the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Success,
    /// The tool ran and exited non-zero.
    Failed { exit_code: i32, stderr: String },
    /// The tool could not be started (or waited on) at all.
    SpawnFailed(String),
}

impl CopyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CopyOutcome::Success)
    }
}

/// Trait abstracting how a single transfer is carried out.
pub trait CopyBackend: Send + Sync {
    fn copy<'a>(
        &'a self,
        request: &'a CopyRequest,
    ) -> Pin<Box<dyn Future<Output = CopyOutcome> + Send + 'a>>;
}

/// Runs the configured external copy tool as a child process.
#[derive(Debug, Clone)]
pub struct ProcessCopyBackend {
    settings: CopySettings,
}

impl ProcessCopyBackend {
    pub fn new(settings: CopySettings) -> Self {
        Self { settings }
    }

    async fn run(&self, request: &CopyRequest) -> CopyOutcome {
        let args = self.settings.copy_args(
            &request.source,
            &request.destination,
            &request.exclusions,
        );
        let cmd_line = self.settings.tool.display_with(&args);
        if self.settings.quiet {
            debug!(job = request.job, cmd = %cmd_line, "starting copy");
        } else {
            info!(job = request.job, cmd = %cmd_line, "starting copy");
        }

        let mut cmd = self.settings.tool.command();
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match cmd
            .output()
            .await
            .with_context(|| format!("running {}", self.settings.tool))
        {
            Ok(output) => output,
            Err(err) => return CopyOutcome::SpawnFailed(format!("{err:#}")),
        };

        if self.settings.test_mode {
            for line in String::from_utf8_lossy(&output.stdout).lines() {
                info!(job = request.job, "{line}");
            }
        }

        if output.status.success() {
            CopyOutcome::Success
        } else {
            CopyOutcome::Failed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
        }
    }
}

impl CopyBackend for ProcessCopyBackend {
    fn copy<'a>(
        &'a self,
        request: &'a CopyRequest,
    ) -> Pin<Box<dyn Future<Output = CopyOutcome> + Send + 'a>> {
        Box::pin(self.run(request))
    }
}
