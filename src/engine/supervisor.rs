// src/engine/supervisor.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::{ShutdownHandle, SupervisorEvent};
use crate::errors::{EspSyncError, Result};
use crate::sync::SyncSet;
use crate::types::{JobId, ToolCommand, WatchId};
use crate::watch::{parse_event_line, WatchEvent, WatcherProcess};

/// A registered watch: one job paired with (once started) its watcher
/// process and the task forwarding that process's output.
#[derive(Debug)]
pub struct WatcherHandle {
    id: WatchId,
    job: JobId,
    source: PathBuf,
    process: Option<WatcherProcess>,
    reader: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn id(&self) -> WatchId {
        self.id
    }

    pub fn job(&self) -> JobId {
        self.job
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(WatcherProcess::pid)
    }

    async fn stop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(process) = self.process.as_mut() {
            process.terminate().await;
        }
    }
}

/// Owns every watcher and the sync jobs they feed, and runs the event loop.
///
/// Output from all watchers is multiplexed into one channel tagged with the
/// stable [`WatchId`]; `active` maps those ids back to their handle. A
/// watcher leaves `active` when its source is unmounted, its process exits,
/// or the supervisor shuts down.
#[derive(Debug)]
pub struct WatchSupervisor {
    jobs: SyncSet,
    watch_tool: ToolCommand,
    flush_interval: Duration,
    handles: Vec<WatcherHandle>,
    active: HashMap<WatchId, usize>,
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    events_rx: mpsc::UnboundedReceiver<SupervisorEvent>,
    flushed_on_shutdown: bool,
}

impl WatchSupervisor {
    pub fn new(mut jobs: SyncSet, watch_tool: ToolCommand, flush_interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        jobs.attach_completions(&events_tx);
        Self {
            jobs,
            watch_tool,
            flush_interval,
            handles: Vec::new(),
            active: HashMap::new(),
            events_tx,
            events_rx,
            flushed_on_shutdown: false,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.events_tx.clone())
    }

    pub fn jobs(&self) -> &SyncSet {
        &self.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut SyncSet {
        &mut self.jobs
    }

    pub fn into_jobs(self) -> SyncSet {
        self.jobs
    }

    pub fn handles(&self) -> &[WatcherHandle] {
        &self.handles
    }

    /// Register a job for watching. No process is spawned until
    /// [`WatchSupervisor::start_all`].
    pub fn add_watch(&mut self, job: JobId) -> Result<WatchId> {
        let spec = self.jobs.get(job).map(|j| j.spec()).ok_or_else(|| {
            EspSyncError::ConfigError(format!("cannot watch unknown job {job}"))
        })?;

        let id = self.handles.len();
        info!(watch = id, job, source = %spec.source.display(), destinations = ?spec.destinations, exclusions = ?spec.exclusions, "adding watch");
        self.handles.push(WatcherHandle {
            id,
            job,
            source: spec.source.clone(),
            process: None,
            reader: None,
        });
        Ok(id)
    }

    /// Spawn a watcher for every registered job and rebuild the id lookup.
    /// Jobs whose watcher fails to start are left unwatched.
    pub fn start_all(&mut self) -> usize {
        self.active.clear();

        for (idx, handle) in self.handles.iter_mut().enumerate() {
            if handle.process.as_ref().is_some_and(WatcherProcess::is_active) {
                self.active.insert(handle.id, idx);
                continue;
            }

            let mut process = WatcherProcess::start(&self.watch_tool, &handle.source);
            if let Some(stdout) = process.take_output() {
                handle.reader = Some(spawn_reader(handle.id, stdout, self.events_tx.clone()));
                self.active.insert(handle.id, idx);
            }
            handle.process = Some(process);
        }

        info!(watching = self.active.len(), registered = self.handles.len(), "watchers started");
        self.active.len()
    }

    pub fn active_watches(&self) -> usize {
        self.active.len()
    }

    pub fn is_watching(&self, job: JobId) -> bool {
        self.active.values().any(|&idx| self.handles[idx].job == job)
    }

    /// Run the event loop until no watcher is left, shutdown is requested,
    /// or waiting for events fails; then shut down. A wait failure is
    /// returned after shutdown has completed.
    pub async fn run(&mut self) -> Result<()> {
        let result = self.event_loop().await;
        if let Err(err) = &result {
            error!(error = %err, "event loop failed; shutting down");
        }
        self.shutdown().await;
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        if self.active.is_empty() {
            info!("nothing to watch; event loop not started");
            return Ok(());
        }
        info!(flush_interval = ?self.flush_interval, "monitoring");

        loop {
            self.reap_exited().await;
            if self.active.is_empty() {
                info!("no active watchers remain; leaving event loop");
                return Ok(());
            }

            let event = match tokio::time::timeout(self.flush_interval, self.events_rx.recv()).await {
                Err(_elapsed) => {
                    debug!("no events within flush interval; flushing pending syncs");
                    self.jobs.sync_all_pending();
                    continue;
                }
                Ok(None) => {
                    return Err(EspSyncError::EventLoop("event channel closed".to_string()));
                }
                Ok(Some(event)) => event,
            };

            match event {
                SupervisorEvent::WatchLine { watch, line } => {
                    self.handle_line(watch, &line).await;
                }
                SupervisorEvent::WatchClosed { watch } => {
                    if self.active.contains_key(&watch) {
                        info!(watch, "watcher output closed; dropping watch");
                        self.retire(watch).await;
                    }
                }
                SupervisorEvent::WatchFailed { watch, error } => {
                    return Err(EspSyncError::EventLoop(format!(
                        "reading output of watcher {watch}: {error}"
                    )));
                }
                SupervisorEvent::SyncFinished { job, run } => {
                    self.jobs.on_sync_finished(job, run).await;
                }
                SupervisorEvent::ShutdownRequested => {
                    info!("shutdown requested");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_line(&mut self, watch: WatchId, line: &str) {
        let Some(&idx) = self.active.get(&watch) else {
            debug!(watch, "event from retired watcher ignored");
            return;
        };
        let job = self.handles[idx].job;

        match parse_event_line(line) {
            WatchEvent::Blank => {}
            WatchEvent::Unmount => {
                info!(
                    watch,
                    job,
                    source = %self.handles[idx].source.display(),
                    "watched source unmounted; terminating its watcher"
                );
                self.retire(watch).await;
            }
            WatchEvent::Change(event) => {
                debug!(watch, job, %event, "change detected");
                self.jobs.notify(job);
            }
        }
    }

    /// Terminate and drop any watcher whose process has already exited.
    async fn reap_exited(&mut self) {
        let exited: Vec<WatchId> = self
            .active
            .iter()
            .filter_map(|(&watch, &idx)| {
                let process = self.handles[idx].process.as_mut()?;
                process.has_exited().then_some(watch)
            })
            .collect();

        for watch in exited {
            info!(watch, "watcher process exited; dropping watch");
            self.retire(watch).await;
        }
    }

    async fn retire(&mut self, watch: WatchId) {
        if let Some(idx) = self.active.remove(&watch) {
            self.handles[idx].stop().await;
        }
    }

    /// Terminate every watcher, then launch (without waiting) any pending
    /// sync so no change is dropped. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        self.active.clear();
        for handle in &mut self.handles {
            handle.stop().await;
        }

        if !self.flushed_on_shutdown {
            self.flushed_on_shutdown = true;
            let launched = self.jobs.sync_all_pending();
            info!(launched, "watchers stopped");
        }
    }
}

/// Forward one watcher's output, line by line, into the supervisor channel.
fn spawn_reader(
    watch: WatchId,
    stdout: ChildStdout,
    tx: mpsc::UnboundedSender<SupervisorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(SupervisorEvent::WatchLine { watch, line }).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(SupervisorEvent::WatchClosed { watch });
                    break;
                }
                Err(err) => {
                    let _ = tx.send(SupervisorEvent::WatchFailed {
                        watch,
                        error: err.to_string(),
                    });
                    break;
                }
            }
        }
        debug!(watch, "watcher reader finished");
    })
}
