// src/watch/process.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, ChildStdout};
use tracing::{debug, info, warn};

use crate::errors::EspSyncError;
use crate::types::ToolCommand;

/// Event classes the helper reports.
pub const WATCH_EVENTS: &str = "attrib,create,move,modify,delete,unmount";

/// How long a watcher gets to exit after SIGTERM before it is killed.
pub const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Helper arguments: monitor forever, recursively, one event name per line.
pub fn watch_args(source: &Path) -> Vec<String> {
    vec![
        "-m".to_string(),
        "-r".to_string(),
        "-e".to_string(),
        WATCH_EVENTS.to_string(),
        "--format".to_string(),
        "%e".to_string(),
        source.display().to_string(),
    ]
}

/// One external change-detection process bound to one source directory.
///
/// A failed spawn leaves the wrapper empty (`is_active() == false`) instead
/// of returning an error, so one bad source does not stop the daemon.
/// Dropping the wrapper kills the process.
pub struct WatcherProcess {
    source: PathBuf,
    child: Option<Child>,
    pid: Option<u32>,
}

impl fmt::Debug for WatcherProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherProcess")
            .field("source", &self.source)
            .field("pid", &self.pid)
            .field("active", &self.child.is_some())
            .finish()
    }
}

impl WatcherProcess {
    pub fn start(tool: &ToolCommand, source: &Path) -> Self {
        let args = watch_args(source);
        info!(cmd = %tool.display_with(&args), "starting watcher");

        let mut cmd = tool.command();
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let spawned = cmd.spawn().map_err(|err| EspSyncError::SpawnError {
            tool: tool.to_string(),
            path: source.to_path_buf(),
            source: err,
        });

        match spawned {
            Ok(child) => {
                let pid = child.id();
                debug!(source = %source.display(), ?pid, "watcher started");
                Self {
                    source: source.to_path_buf(),
                    child: Some(child),
                    pid,
                }
            }
            Err(err) => {
                warn!(error = %err, "source will not be watched");
                Self {
                    source: source.to_path_buf(),
                    child: None,
                    pid: None,
                }
            }
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_active(&self) -> bool {
        self.child.is_some()
    }

    /// Hand the line-oriented output stream to the caller. Only the first
    /// call returns `Some`.
    pub fn take_output(&mut self) -> Option<ChildStdout> {
        self.child.as_mut()?.stdout.take()
    }

    /// True once the process is gone (or was never started).
    pub fn has_exited(&mut self) -> bool {
        match self.child.as_mut() {
            None => true,
            Some(child) => match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(source = %self.source.display(), %status, "watcher exited");
                    true
                }
                Ok(None) => false,
                Err(err) => {
                    warn!(source = %self.source.display(), error = %err, "cannot query watcher status");
                    true
                }
            },
        }
    }

    /// Stop the process: SIGTERM, then SIGKILL through the handle if it is
    /// still alive after [`TERMINATE_GRACE`], then SIGKILL by recorded pid
    /// if the handle cannot deliver it. Safe to call repeatedly.
    pub async fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = self.pid.take();

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }

        if let Some(pid) = pid {
            match signal_pid(pid, Signal::SIGTERM) {
                Ok(()) => {
                    if let Ok(Ok(status)) = tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
                        debug!(source = %self.source.display(), pid, %status, "watcher terminated");
                        return;
                    }
                }
                Err(err) => {
                    debug!(pid, error = %err, "SIGTERM not delivered; escalating");
                }
            }
        }

        force_kill(&mut child, pid);
        if tokio::time::timeout(TERMINATE_GRACE, child.wait()).await.is_err() {
            warn!(source = %self.source.display(), ?pid, "watcher did not exit after kill");
        }
    }

    /// Non-blocking variant of [`WatcherProcess::terminate`] for drop paths.
    pub fn terminate_now(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = self.pid.take();

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        force_kill(&mut child, pid);
    }
}

impl Drop for WatcherProcess {
    fn drop(&mut self) {
        self.terminate_now();
    }
}

fn force_kill(child: &mut Child, pid: Option<u32>) {
    if let Err(err) = child.start_kill() {
        debug!(?pid, error = %err, "kill through handle failed; signalling pid");
        if let Some(pid) = pid {
            if let Err(err) = signal_pid(pid, Signal::SIGKILL) {
                debug!(pid, error = %err, "SIGKILL by pid failed");
            }
        }
    }
}

fn signal_pid(pid: u32, signal: Signal) -> nix::Result<()> {
    let raw = i32::try_from(pid).map_err(|_| nix::errno::Errno::ESRCH)?;
    if raw <= 1 {
        return Err(nix::errno::Errno::EPERM);
    }
    kill(Pid::from_raw(raw), signal)
}
