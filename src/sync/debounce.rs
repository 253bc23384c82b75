// src/sync/debounce.rs

//! Pure debounce state for one sync job.
//!
//! No Tokio tasks, no processes: the caller passes in the current time and
//! whether a copy is in flight, and gets back what to do. [`super::SyncJob`]
//! owns the in-flight task and applies the decisions.

use std::time::Duration;

use tokio::time::Instant;

/// Observable scheduling state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Pending,
    Running,
    RunningWithPending,
}

/// What a notify call decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDecision {
    /// Launch a copy now.
    LaunchNow,
    /// Too soon after the last run; marked pending.
    Debounced,
    /// A copy is in flight; marked pending for a relaunch on completion.
    AlreadyRunning,
}

#[derive(Debug, Clone)]
pub struct Debounce {
    min_interval: Duration,
    last_run_at: Option<Instant>,
    pending: bool,
}

impl Debounce {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_run_at: None,
            pending: false,
        }
    }

    pub fn on_notify(&mut self, now: Instant, running: bool) -> NotifyDecision {
        if running {
            self.pending = true;
            return NotifyDecision::AlreadyRunning;
        }

        match self.last_run_at {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => {
                self.pending = true;
                NotifyDecision::Debounced
            }
            _ => NotifyDecision::LaunchNow,
        }
    }

    /// A copy was launched at `now`; clears the pending flag.
    pub fn record_launch(&mut self, now: Instant) {
        self.last_run_at = Some(now);
        self.pending = false;
    }

    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn last_run_at(&self) -> Option<Instant> {
        self.last_run_at
    }

    pub fn state(&self, running: bool) -> JobState {
        match (running, self.pending) {
            (false, false) => JobState::Idle,
            (false, true) => JobState::Pending,
            (true, false) => JobState::Running,
            (true, true) => JobState::RunningWithPending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_secs(300);

    #[test]
    fn first_notify_launches_immediately() {
        let mut d = Debounce::new(DELAY);
        assert_eq!(d.on_notify(Instant::now(), false), NotifyDecision::LaunchNow);
    }

    #[test]
    fn notify_within_interval_marks_pending() {
        let mut d = Debounce::new(DELAY);
        let t0 = Instant::now();
        d.record_launch(t0);

        let decision = d.on_notify(t0 + Duration::from_secs(10), false);
        assert_eq!(decision, NotifyDecision::Debounced);
        assert_eq!(d.state(false), JobState::Pending);
    }

    #[test]
    fn notify_after_interval_launches_again() {
        let mut d = Debounce::new(DELAY);
        let t0 = Instant::now();
        d.record_launch(t0);

        assert_eq!(d.on_notify(t0 + DELAY, false), NotifyDecision::LaunchNow);
    }

    #[test]
    fn notify_while_running_never_relaunches() {
        let mut d = Debounce::new(DELAY);
        let t0 = Instant::now();
        d.record_launch(t0);

        let later = t0 + DELAY * 2;
        assert_eq!(d.on_notify(later, true), NotifyDecision::AlreadyRunning);
        assert_eq!(d.state(true), JobState::RunningWithPending);
    }

    #[test]
    fn launch_clears_pending() {
        let mut d = Debounce::new(DELAY);
        d.mark_pending();
        d.record_launch(Instant::now());
        assert!(!d.is_pending());
        assert_eq!(d.state(true), JobState::Running);
    }
}
