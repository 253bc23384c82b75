use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use espsync::exec::{CopyBackend, CopyOutcome, CopyRequest};
use espsync::types::JobId;

#[derive(Default)]
struct FakeState {
    requests: Vec<CopyRequest>,
    in_flight: HashMap<JobId, usize>,
    max_in_flight: HashMap<JobId, usize>,
}

/// A fake copy backend that:
/// - records every request it receives
/// - "copies" by sleeping for a configurable delay (tokio time, so a paused
///   clock controls it)
/// - tracks how many copies of the same job overlap
/// - fails selected destinations with a non-zero exit code.
///
/// Clones share state, so a test keeps one clone for inspection.
#[derive(Clone, Default)]
pub struct FakeCopyBackend {
    state: Arc<Mutex<FakeState>>,
    delay: Duration,
    failing: Arc<HashSet<PathBuf>>,
}

impl FakeCopyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        let mut failing = (*self.failing).clone();
        failing.insert(destination.into());
        self.failing = Arc::new(failing);
        self
    }

    pub fn requests(&self) -> Vec<CopyRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Copy requests seen for `job` (one per destination per run).
    pub fn copies_for(&self, job: JobId) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.job == job)
            .count()
    }

    /// Highest number of simultaneously running copies observed for `job`.
    pub fn max_concurrent(&self, job: JobId) -> usize {
        self.state
            .lock()
            .unwrap()
            .max_in_flight
            .get(&job)
            .copied()
            .unwrap_or(0)
    }
}

impl CopyBackend for FakeCopyBackend {
    fn copy<'a>(
        &'a self,
        request: &'a CopyRequest,
    ) -> Pin<Box<dyn Future<Output = CopyOutcome> + Send + 'a>> {
        Box::pin(async move {
            {
                let mut state = self.state.lock().unwrap();
                state.requests.push(request.clone());
                let now = {
                    let n = state.in_flight.entry(request.job).or_default();
                    *n += 1;
                    *n
                };
                let max = state.max_in_flight.entry(request.job).or_default();
                *max = (*max).max(now);
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            {
                let mut state = self.state.lock().unwrap();
                if let Some(n) = state.in_flight.get_mut(&request.job) {
                    *n -= 1;
                }
            }

            if self.failing.contains(&request.destination) {
                CopyOutcome::Failed {
                    exit_code: 23,
                    stderr: "simulated copy failure".to_string(),
                }
            } else {
                CopyOutcome::Success
            }
        })
    }
}
