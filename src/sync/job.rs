// src/sync/job.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SyncSpec;
use crate::engine::SupervisorEvent;
use crate::exec::{CopyBackend, CopyOutcome, CopyRequest};
use crate::sync::debounce::{Debounce, JobState, NotifyDecision};
use crate::types::{JobId, RunId, Timing};

/// The copy task currently (or most recently) launched for a job.
struct InFlight {
    run: RunId,
    handle: JoinHandle<()>,
}

/// Runtime wrapper around one [`SyncSpec`].
///
/// Owns the debounce state and at most one in-flight copy task. Liveness
/// is checked through the task's `JoinHandle` before every launch, so a
/// second copy for the same job can never start while one is outstanding.
/// All methods are meant to be called from a single coordinating task.
pub struct SyncJob {
    id: JobId,
    spec: Arc<SyncSpec>,
    backend: Arc<dyn CopyBackend>,
    debounce: Debounce,
    in_flight: Option<InFlight>,
    runs_launched: RunId,
    in_flight_poll: Duration,
    completions: Option<mpsc::UnboundedSender<SupervisorEvent>>,
}

impl fmt::Debug for SyncJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncJob")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .field("state", &self.state())
            .field("runs_launched", &self.runs_launched)
            .finish_non_exhaustive()
    }
}

impl SyncJob {
    pub fn new(id: JobId, spec: SyncSpec, backend: Arc<dyn CopyBackend>, timing: &Timing) -> Self {
        Self {
            id,
            spec: Arc::new(spec),
            backend,
            debounce: Debounce::new(timing.sync_delay),
            in_flight: None,
            runs_launched: 0,
            in_flight_poll: timing.in_flight_poll,
            completions: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn spec(&self) -> &SyncSpec {
        &self.spec
    }

    /// Completed copy tasks report `SyncFinished` on this channel.
    pub fn set_completion_sender(&mut self, tx: mpsc::UnboundedSender<SupervisorEvent>) {
        self.completions = Some(tx);
    }

    pub fn is_running(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| !f.handle.is_finished())
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn state(&self) -> JobState {
        self.debounce.state(self.is_running())
    }

    pub fn last_run_at(&self) -> Option<Instant> {
        self.debounce.last_run_at()
    }

    /// Number of copy tasks launched so far.
    pub fn runs_launched(&self) -> RunId {
        self.runs_launched
    }

    /// Debounced trigger; called for every change event on the source.
    pub fn notify(&mut self) -> NotifyDecision {
        let now = Instant::now();
        let decision = self.debounce.on_notify(now, self.is_running());
        match decision {
            NotifyDecision::LaunchNow => {
                self.launch(now);
            }
            NotifyDecision::Debounced => {
                debug!(job = self.id, "change within sync delay; marked pending");
            }
            NotifyDecision::AlreadyRunning => {
                debug!(job = self.id, "change while copy in flight; marked pending");
            }
        }
        decision
    }

    /// Launch now, ignoring the sync delay. If a copy is already in flight
    /// the job is left pending instead.
    pub fn sync_no_delay(&mut self) -> bool {
        self.debounce.mark_pending();
        self.launch(Instant::now())
    }

    /// If pending (or `force`), wait for any in-flight copy to finish and
    /// then launch. Waiting is a bounded-sleep poll on task liveness.
    pub async fn sync_if_needed(&mut self, force: bool) -> bool {
        if !(force || self.debounce.is_pending()) {
            return false;
        }

        while self.is_running() {
            debug!(job = self.id, "waiting for in-flight copy before resync");
            tokio::time::sleep(self.in_flight_poll).await;
        }
        self.launch(Instant::now())
    }

    /// Non-blocking flush: launch if pending and nothing is in flight.
    pub fn sync_pending(&mut self) -> bool {
        if !self.debounce.is_pending() {
            return false;
        }
        self.launch(Instant::now())
    }

    /// Completion of run `run`. Relaunches once, without the sync delay, if
    /// the job became pending while that run was in flight. Reports for
    /// any run other than the current one are ignored.
    pub async fn on_sync_finished(&mut self, run: RunId) -> bool {
        if !matches!(&self.in_flight, Some(f) if f.run == run) {
            debug!(job = self.id, run, "ignoring completion of superseded run");
            return false;
        }

        if let Some(finished) = self.in_flight.take() {
            if let Err(err) = finished.handle.await {
                warn!(job = self.id, run, error = %err, "copy task ended abnormally");
            }
        }

        if self.debounce.is_pending() {
            info!(job = self.id, "changes arrived during copy; syncing again");
            self.launch(Instant::now())
        } else {
            false
        }
    }

    /// Wait for the in-flight copy, if any, to complete.
    pub async fn wait_idle(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            if let Err(err) = in_flight.handle.await {
                warn!(job = self.id, run = in_flight.run, error = %err, "copy task ended abnormally");
            }
        }
    }

    fn launch(&mut self, now: Instant) -> bool {
        if self.is_running() {
            debug!(job = self.id, "copy already in flight; not launching another");
            return false;
        }

        self.debounce.record_launch(now);
        self.runs_launched += 1;
        let run = self.runs_launched;

        let job = self.id;
        let spec = Arc::clone(&self.spec);
        let backend = Arc::clone(&self.backend);
        let completions = self.completions.clone();

        info!(job, run, source = %spec.source.display(), "sync launched");
        let handle = tokio::spawn(async move {
            let failures = copy_to_destinations(job, &spec, backend.as_ref()).await;
            if failures > 0 {
                warn!(job, run, failures, "sync finished with failed destinations");
            } else {
                info!(job, run, "sync finished");
            }
            if let Some(tx) = completions {
                // Receiver is gone once the supervisor has shut down.
                let _ = tx.send(SupervisorEvent::SyncFinished { job, run });
            }
        });

        self.in_flight = Some(InFlight { run, handle });
        true
    }
}

/// Copy the source onto each destination in order. A failed destination
/// is logged and skipped; the remaining destinations are still attempted.
async fn copy_to_destinations(job: JobId, spec: &SyncSpec, backend: &dyn CopyBackend) -> usize {
    let mut failures = 0;

    for destination in &spec.destinations {
        let request = CopyRequest {
            job,
            source: spec.source.clone(),
            destination: destination.clone(),
            exclusions: spec.exclusions.clone(),
        };

        match backend.copy(&request).await {
            CopyOutcome::Success => {
                debug!(job, destination = %destination.display(), "copy complete");
            }
            CopyOutcome::Failed { exit_code, stderr } => {
                failures += 1;
                error!(
                    job,
                    source = %spec.source.display(),
                    destination = %destination.display(),
                    exit_code,
                    "copy failed: {stderr}"
                );
            }
            CopyOutcome::SpawnFailed(err) => {
                failures += 1;
                error!(
                    job,
                    destination = %destination.display(),
                    error = %err,
                    "copy tool could not be started; destination skipped"
                );
            }
        }
    }

    failures
}
