// src/types.rs

use std::path::PathBuf;
use std::time::Duration;

/// Index of a [`crate::sync::SyncJob`] inside its [`crate::sync::SyncSet`].
pub type JobId = usize;

/// Stable identifier of one watcher, assigned when the watch is registered.
///
/// The supervisor resolves readiness on a watcher's output back to the
/// owning handle through this id rather than through object identity.
pub type WatchId = usize;

/// Per-job sequence number of a launched copy task.
pub type RunId = u64;

pub const DEFAULT_SYNC_DELAY: Duration = Duration::from_secs(300);
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_IN_FLIGHT_POLL: Duration = Duration::from_secs(2);

/// Timing knobs shared by every job and by the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Minimum time between two debounced launches of the same job.
    pub sync_delay: Duration,
    /// How long the event loop waits for activity before flushing pending jobs.
    pub flush_interval: Duration,
    /// Sleep between liveness checks while waiting for an in-flight copy.
    pub in_flight_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sync_delay: DEFAULT_SYNC_DELAY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            in_flight_poll: DEFAULT_IN_FLIGHT_POLL,
        }
    }
}

/// An external program plus any leading arguments, e.g. `"/usr/bin/rsync"`
/// or `"sh /tmp/fake-rsync.sh"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Split a command string on whitespace. Returns `None` for a blank string.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let program = PathBuf::from(parts.next()?);
        Some(Self {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }

    /// A `tokio` command with the leading arguments already applied.
    pub fn command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    pub fn display_with(&self, extra: &[String]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.extend(extra.iter().cloned());
        parts.join(" ")
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_with(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_and_leading_args() {
        let tool = ToolCommand::parse("  sh /tmp/fake.sh ").unwrap();
        assert_eq!(tool.program, PathBuf::from("sh"));
        assert_eq!(tool.args, vec!["/tmp/fake.sh".to_string()]);
        assert_eq!(tool.to_string(), "sh /tmp/fake.sh");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(ToolCommand::parse("   ").is_none());
    }
}
