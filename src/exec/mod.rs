// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] assembles the copy-tool command line.
//! - [`backend`] provides the `CopyBackend` trait and the production
//!   `ProcessCopyBackend`, which tests replace with a fake.
//! - [`prio`] applies niceness / I/O priority to the daemon process.

pub mod backend;
pub mod command;
pub mod prio;

pub use backend::{CopyBackend, CopyOutcome, CopyRequest, ProcessCopyBackend};
pub use command::CopySettings;
pub use prio::{IoClass, Priority};
