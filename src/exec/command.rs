// src/exec/command.rs

//! Copy-tool command line assembly.

use std::path::Path;

use crate::types::ToolCommand;

/// Archive mode, hard links, ACLs and extended attributes.
pub const ARCHIVE_FLAGS: &str = "-aHAX";
/// Remove destination entries that no longer exist in the source.
pub const DELETE_FLAG: &str = "--delete";
/// Filesystem recovery directory, never copied.
pub const RESERVED_EXCLUDE: &str = "--exclude=/lost+found/";
/// Added in test mode: no-op transfer, list what would change.
pub const DRY_RUN_FLAGS: [&str; 2] = ["-n", "-v"];

/// Settings shared by every copy-tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySettings {
    pub tool: ToolCommand,
    /// Extra flags from the config (`rsync_opts`).
    pub base_opts: Vec<String>,
    /// Dry-run: pass [`DRY_RUN_FLAGS`] and surface the tool's output.
    pub test_mode: bool,
    /// Demote the per-invocation command echo to debug level.
    pub quiet: bool,
}

impl CopySettings {
    pub fn new(tool: ToolCommand, base_opts: Vec<String>) -> Self {
        Self {
            tool,
            base_opts,
            test_mode: false,
            quiet: false,
        }
    }

    /// Full flag list for one source, in invocation order.
    pub fn flags(&self, exclusions: &[String]) -> Vec<String> {
        let mut flags = Vec::with_capacity(self.base_opts.len() + exclusions.len() + 5);
        if self.test_mode {
            flags.extend(DRY_RUN_FLAGS.iter().map(|s| s.to_string()));
        }
        flags.push(ARCHIVE_FLAGS.to_string());
        flags.extend(self.base_opts.iter().cloned());
        flags.push(RESERVED_EXCLUDE.to_string());
        flags.push(DELETE_FLAG.to_string());
        flags.extend(exclusions.iter().map(|pat| format!("--exclude={pat}")));
        flags
    }

    /// Arguments after the tool itself: flags, then `source/ destination/`.
    pub fn copy_args(&self, source: &Path, destination: &Path, exclusions: &[String]) -> Vec<String> {
        let mut args = self.flags(exclusions);
        args.push(dir_arg(source));
        args.push(dir_arg(destination));
        args
    }
}

/// Render a directory with exactly one trailing slash so the tool copies
/// its contents rather than the directory itself.
pub fn dir_arg(path: &Path) -> String {
    let s = path.to_string_lossy();
    let trimmed = s.trim_end_matches('/');
    format!("{trimmed}/")
}
