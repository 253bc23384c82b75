// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EspSyncError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pre-flight sanity check failed; every problem found is listed.
    #[error("Sync list rejected:\n  {}", .0.join("\n  "))]
    SanityError(Vec<String>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to start {tool} for {path:?}: {source}")]
    SpawnError {
        tool: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Event loop failure: {0}")]
    EventLoop(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, EspSyncError>;
