// src/watch/mod.rs

//! Change detection via an external watch helper.
//!
//! This module is responsible for:
//! - Spawning and terminating one helper process per sync source
//!   ([`process`]).
//! - Interpreting the helper's one-event-per-line output ([`events`]).
//!
//! It does **not** decide when to sync; the supervisor in
//! [`crate::engine`] routes events to the owning job.

pub mod events;
pub mod process;

pub use events::{parse_event_line, WatchEvent};
pub use process::{watch_args, WatcherProcess, TERMINATE_GRACE, WATCH_EVENTS};
