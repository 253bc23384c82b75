#![allow(dead_code)]

use std::time::Duration;

use espsync::config::{ConfigFile, RawConfigFile, RawField, RawSyncEntry, RawSyncList};
use espsync::types::Timing;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Goes through `RawConfigFile` so the same validation as a real config
/// file applies.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    entries: Vec<RawSyncEntry>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
            entries: Vec::new(),
        }
    }

    pub fn with_sync(mut self, source: &str, destinations: &[&str], exclusions: &[&str]) -> Self {
        let mut fields = vec![
            RawField::One(source.to_string()),
            RawField::Many(destinations.iter().map(|s| s.to_string()).collect()),
        ];
        if !exclusions.is_empty() {
            fields.push(RawField::Many(exclusions.iter().map(|s| s.to_string()).collect()));
        }
        self.entries.push(RawSyncEntry(fields));
        self
    }

    pub fn with_sync_delay(mut self, secs: f64) -> Self {
        self.config.sync_delay = secs;
        self
    }

    pub fn with_flush_interval(mut self, secs: f64) -> Self {
        self.config.flush_interval = secs;
        self
    }

    pub fn with_copy_tool(mut self, cmd: &str) -> Self {
        self.config.copy_tool = cmd.to_string();
        self
    }

    pub fn with_watch_tool(mut self, cmd: &str) -> Self {
        self.config.watch_tool = cmd.to_string();
        self
    }

    pub fn with_rsync_opts(mut self, opts: &str) -> Self {
        self.config.rsync_opts = opts.to_string();
        self
    }

    pub fn build_raw(mut self) -> RawConfigFile {
        if !self.entries.is_empty() {
            self.config.sync = Some(RawSyncList::Many(self.entries));
        }
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.build_raw()).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing with the given sync delay, a long flush interval and a short
/// in-flight poll.
pub fn timing(sync_delay: Duration) -> Timing {
    Timing {
        sync_delay,
        flush_interval: Duration::from_secs(900),
        in_flight_poll: Duration::from_millis(10),
    }
}

/// Timing for supervisor tests: explicit flush interval.
pub fn timing_with_flush(sync_delay: Duration, flush_interval: Duration) -> Timing {
    Timing {
        flush_interval,
        ..timing(sync_delay)
    }
}
