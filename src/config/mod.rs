// src/config/mod.rs

//! Configuration loading and validation for espsync.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate structure, glob patterns and tuning values (`validate.rs`).
//! - Run the pre-flight sanity check over the sync list (`sanity.rs`).

pub mod loader;
pub mod model;
pub mod sanity;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile, RawField, RawSyncEntry, RawSyncList, SyncSpec};
pub use sanity::check_sync_list;
