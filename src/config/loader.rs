// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// A missing file is not an error: it yields the defaults (and therefore an
/// empty sync list). This only performs TOML deserialization; use
/// [`load_and_validate`] for structural validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "config file not found; using defaults");
        return Ok(RawConfigFile::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run structural validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Normalizes each sync entry and checks exclusion globs and timing values.
///
/// The filesystem-level sanity check is separate, see
/// [`crate::config::check_sync_list`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("/etc/dual-root/sync-daemon.conf")
}
