// src/sync/set.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::SyncSpec;
use crate::engine::SupervisorEvent;
use crate::exec::CopyBackend;
use crate::sync::debounce::NotifyDecision;
use crate::sync::job::SyncJob;
use crate::types::{JobId, RunId, Timing};

/// Every [`SyncJob`] built from the validated sync list, indexed by [`JobId`].
#[derive(Debug)]
pub struct SyncSet {
    jobs: Vec<SyncJob>,
}

impl SyncSet {
    pub fn new(specs: &[SyncSpec], backend: Arc<dyn CopyBackend>, timing: &Timing) -> Self {
        let jobs = specs
            .iter()
            .cloned()
            .enumerate()
            .map(|(id, spec)| SyncJob::new(id, spec, Arc::clone(&backend), timing))
            .collect();
        Self { jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = JobId> + '_ {
        self.jobs.iter().map(SyncJob::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncJob> {
        self.jobs.iter()
    }

    pub fn get(&self, job: JobId) -> Option<&SyncJob> {
        self.jobs.get(job)
    }

    pub fn get_mut(&mut self, job: JobId) -> Option<&mut SyncJob> {
        self.jobs.get_mut(job)
    }

    pub fn attach_completions(&mut self, tx: &mpsc::UnboundedSender<SupervisorEvent>) {
        for job in &mut self.jobs {
            job.set_completion_sender(tx.clone());
        }
    }

    pub fn notify(&mut self, job: JobId) -> Option<NotifyDecision> {
        self.jobs.get_mut(job).map(SyncJob::notify)
    }

    /// Sync every job now, regardless of pending state. Each job first
    /// waits out its own in-flight copy. Does not wait for the launched
    /// copies; see [`SyncSet::wait_all`].
    pub async fn sync_all(&mut self) {
        info!(jobs = self.jobs.len(), "syncing all sources");
        for job in &mut self.jobs {
            job.sync_if_needed(true).await;
        }
    }

    /// Sync every pending job, waiting out in-flight copies first.
    pub async fn sync_all_if_needed(&mut self) {
        for job in &mut self.jobs {
            job.sync_if_needed(false).await;
        }
    }

    /// Launch every pending job that has nothing in flight. Never waits.
    pub fn sync_all_pending(&mut self) -> usize {
        let launched = self
            .jobs
            .iter_mut()
            .map(SyncJob::sync_pending)
            .filter(|launched| *launched)
            .count();
        if launched > 0 {
            debug!(launched, "flushed pending syncs");
        }
        launched
    }

    pub async fn on_sync_finished(&mut self, job: JobId, run: RunId) -> bool {
        match self.jobs.get_mut(job) {
            Some(j) => j.on_sync_finished(run).await,
            None => false,
        }
    }

    pub async fn wait_all(&mut self) {
        for job in &mut self.jobs {
            job.wait_idle().await;
        }
    }

    /// Final drain before exit: run anything still pending, then wait for
    /// every in-flight copy to complete.
    pub async fn finish(&mut self) {
        self.sync_all_if_needed().await;
        self.wait_all().await;
        info!("all syncs complete");
    }
}
