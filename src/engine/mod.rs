// src/engine/mod.rs

//! Supervision engine for espsync.
//!
//! This module ties together:
//! - one watcher process per sync job
//! - the event loop that multiplexes all watcher output with a periodic
//!   flush timeout
//! - copy-task completion reports
//! - shutdown requests from signals
//!
//! The loop itself lives in [`supervisor`]; signal wiring in [`signals`].

use tokio::sync::mpsc;

use crate::types::{JobId, RunId, WatchId};

/// Events flowing into the supervisor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A watcher emitted one line of event text.
    WatchLine { watch: WatchId, line: String },
    /// A watcher's output reached end-of-file (the process went away).
    WatchClosed { watch: WatchId },
    /// Reading a watcher's output failed.
    WatchFailed { watch: WatchId, error: String },
    /// A copy task finished all of its destinations.
    SyncFinished { job: JobId, run: RunId },
    /// Stop watching and shut down (signal or caller request).
    ShutdownRequested,
}

/// Cloneable trigger for [`supervisor::WatchSupervisor::shutdown`].
///
/// Handed explicitly to signal handlers; triggering it is the only thing
/// they do.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<SupervisorEvent>,
}

impl ShutdownHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SupervisorEvent>) -> Self {
        Self { tx }
    }

    /// Request shutdown. Returns false if the supervisor is already gone.
    pub fn trigger(&self) -> bool {
        self.tx.send(SupervisorEvent::ShutdownRequested).is_ok()
    }
}

pub mod signals;
pub mod supervisor;

pub use signals::register_signal_handlers;
pub use supervisor::{WatchSupervisor, WatcherHandle};
