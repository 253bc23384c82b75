// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::{CopySettings, Priority};
use crate::types::{Timing, ToolCommand};

pub const DEFAULT_RSYNC_OPTS: &str = "-x";
pub const DEFAULT_COPY_TOOL: &str = "/usr/bin/rsync";
pub const DEFAULT_WATCH_TOOL: &str = "/usr/bin/inotifywait";

/// Configuration as read from the TOML file, before validation.
///
/// ```toml
/// rsync_opts = "-x"
/// nice = 19
/// ionice_class = 3
/// ionice_level = 6
/// sync_delay = 300
///
/// sync = [
///     ["/efi0/", "/efi1/"],
///     ["/srv/boot-extra", ["/mnt/a", "/mnt/b"], ["*.bak", "tmp/"]],
/// ]
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Extra copy-tool flags, split on whitespace.
    #[serde(default = "default_rsync_opts")]
    pub rsync_opts: String,

    #[serde(default = "default_nice")]
    pub nice: i32,

    /// 0 = none, 1 = realtime, 2 = best-effort, 3 = idle.
    #[serde(default = "default_ionice_class")]
    pub ionice_class: i32,

    #[serde(default = "default_ionice_level")]
    pub ionice_level: i32,

    /// Seconds between debounced syncs of the same source.
    #[serde(default = "default_sync_delay")]
    pub sync_delay: f64,

    /// Seconds of event-loop silence before pending syncs are flushed.
    #[serde(default = "default_flush_interval")]
    pub flush_interval: f64,

    #[serde(default = "default_copy_tool")]
    pub copy_tool: String,

    #[serde(default = "default_watch_tool")]
    pub watch_tool: String,

    #[serde(default)]
    pub sync: Option<RawSyncList>,
}

fn default_rsync_opts() -> String {
    DEFAULT_RSYNC_OPTS.to_string()
}

fn default_nice() -> i32 {
    19
}

fn default_ionice_class() -> i32 {
    3
}

fn default_ionice_level() -> i32 {
    6
}

fn default_sync_delay() -> f64 {
    crate::types::DEFAULT_SYNC_DELAY.as_secs_f64()
}

fn default_flush_interval() -> f64 {
    crate::types::DEFAULT_FLUSH_INTERVAL.as_secs_f64()
}

fn default_copy_tool() -> String {
    DEFAULT_COPY_TOOL.to_string()
}

fn default_watch_tool() -> String {
    DEFAULT_WATCH_TOOL.to_string()
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            rsync_opts: default_rsync_opts(),
            nice: default_nice(),
            ionice_class: default_ionice_class(),
            ionice_level: default_ionice_level(),
            sync_delay: default_sync_delay(),
            flush_interval: default_flush_interval(),
            copy_tool: default_copy_tool(),
            watch_tool: default_watch_tool(),
            sync: None,
        }
    }
}

/// `sync = ...` accepts either a list of entries or a single bare entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSyncList {
    Many(Vec<RawSyncEntry>),
    One(RawSyncEntry),
}

impl RawSyncList {
    pub fn into_entries(self) -> Vec<RawSyncEntry> {
        match self {
            RawSyncList::Many(entries) => entries,
            RawSyncList::One(entry) => vec![entry],
        }
    }
}

/// `[source, destination(s), exclusions?]`
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RawSyncEntry(pub Vec<RawField>);

/// One position of a sync entry: a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    One(String),
    Many(Vec<String>),
}

impl RawField {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            RawField::One(s) => vec![s],
            RawField::Many(v) => v,
        }
    }
}

/// One source mirrored onto one or more destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSpec {
    pub source: PathBuf,
    pub destinations: Vec<PathBuf>,
    pub exclusions: Vec<String>,
}

impl SyncSpec {
    pub fn new(
        source: impl Into<PathBuf>,
        destinations: impl IntoIterator<Item = impl Into<PathBuf>>,
        exclusions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            source: source.into(),
            destinations: destinations.into_iter().map(Into::into).collect(),
            exclusions: exclusions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validated configuration.
///
/// Constructed via `ConfigFile::try_from(RawConfigFile)`; see `validate.rs`.
/// The sync list has passed structural checks only; filesystem checks are
/// done separately by [`crate::config::check_sync_list`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub sync_list: Vec<SyncSpec>,
    pub copy: CopySettings,
    pub watch_tool: ToolCommand,
    pub priority: Priority,
    pub timing: Timing,
}
