// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile, RawField, RawSyncEntry, SyncSpec};
use crate::errors::{EspSyncError, Result};
use crate::exec::{CopySettings, Priority};
use crate::types::{Timing, ToolCommand, DEFAULT_IN_FLIGHT_POLL};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::EspSyncError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timing = Timing {
            sync_delay: seconds("sync_delay", raw.sync_delay)?,
            flush_interval: seconds("flush_interval", raw.flush_interval)?,
            in_flight_poll: DEFAULT_IN_FLIGHT_POLL,
        };
        if timing.flush_interval.is_zero() {
            return Err(EspSyncError::ConfigError(
                "flush_interval must be > 0".to_string(),
            ));
        }

        let copy_tool = tool("copy_tool", &raw.copy_tool)?;
        let watch_tool = tool("watch_tool", &raw.watch_tool)?;

        let sync_list = match raw.sync {
            Some(list) => list
                .into_entries()
                .into_iter()
                .enumerate()
                .map(|(idx, entry)| sync_spec_from_entry(idx, entry))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(ConfigFile {
            sync_list,
            copy: CopySettings::new(
                copy_tool,
                raw.rsync_opts.split_whitespace().map(str::to_string).collect(),
            ),
            watch_tool,
            priority: Priority::new(raw.nice, raw.ionice_class, raw.ionice_level),
            timing,
        })
    }
}

fn seconds(key: &str, value: f64) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        return Err(EspSyncError::ConfigError(format!(
            "{key} must be a non-negative number of seconds (got {value})"
        )));
    }
    Duration::try_from_secs_f64(value).map_err(|e| {
        EspSyncError::ConfigError(format!("{key} is out of range (got {value}): {e}"))
    })
}

fn tool(key: &str, value: &str) -> Result<ToolCommand> {
    ToolCommand::parse(value)
        .ok_or_else(|| EspSyncError::ConfigError(format!("{key} must not be empty")))
}

/// Map `[source, destination(s), exclusions?]` to a [`SyncSpec`].
fn sync_spec_from_entry(idx: usize, entry: RawSyncEntry) -> Result<SyncSpec> {
    let mut fields = entry.0.into_iter();

    let source = match fields.next() {
        Some(RawField::One(src)) if !src.trim().is_empty() => PathBuf::from(src),
        Some(RawField::One(_)) => return Err(entry_error(idx, "source is empty")),
        Some(RawField::Many(_)) => {
            return Err(entry_error(idx, "source must be a single path"));
        }
        None => return Err(entry_error(idx, "missing source and destination")),
    };

    let destinations: Vec<PathBuf> = match fields.next() {
        Some(field) => field
            .into_vec()
            .into_iter()
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .collect(),
        None => Vec::new(),
    };
    if destinations.is_empty() {
        return Err(entry_error(
            idx,
            &format!("{source:?} has no destination"),
        ));
    }

    let exclusions = fields.next().map(RawField::into_vec).unwrap_or_default();
    for pattern in &exclusions {
        Glob::new(pattern).map_err(|e| {
            entry_error(idx, &format!("invalid exclusion pattern '{pattern}': {e}"))
        })?;
    }

    if fields.next().is_some() {
        return Err(entry_error(
            idx,
            "expected [source, destination(s), exclusions]",
        ));
    }

    Ok(SyncSpec {
        source,
        destinations,
        exclusions,
    })
}

fn entry_error(idx: usize, msg: &str) -> EspSyncError {
    EspSyncError::ConfigError(format!("sync entry #{}: {msg}", idx + 1))
}
