// src/sync/mod.rs

//! Sync jobs and their scheduling.
//!
//! - [`debounce`] is the pure per-job state machine
//!   (`idle`, `pending`, `running`, `running-with-pending`).
//! - [`job`] wraps one `SyncSpec` with that state and its in-flight copy task.
//! - [`set`] builds all jobs from the sync list and offers the bulk
//!   "sync all now" / "sync all if due" operations.

pub mod debounce;
pub mod job;
pub mod set;

pub use crate::config::SyncSpec;
pub use debounce::{Debounce, JobState, NotifyDecision};
pub use job::SyncJob;
pub use set::SyncSet;
