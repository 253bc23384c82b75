// tests/debounce_burst.rs

use std::sync::Arc;
use std::time::Duration;

use espsync::engine::SupervisorEvent;
use espsync::sync::{JobState, NotifyDecision, SyncSet, SyncSpec};
use espsync_test_utils::builders::timing;
use espsync_test_utils::fake_backend::FakeCopyBackend;
use espsync_test_utils::init_tracing;
use tokio::sync::mpsc;

const SYNC_DELAY: Duration = Duration::from_secs(300);
const COPY_TIME: Duration = Duration::from_secs(10);

fn one_job(fake: &FakeCopyBackend) -> (SyncSet, mpsc::UnboundedReceiver<SupervisorEvent>) {
    let specs = vec![SyncSpec::new("/efi0", ["/efi1"], Vec::<String>::new())];
    let mut jobs = SyncSet::new(&specs, Arc::new(fake.clone()), &timing(SYNC_DELAY));
    let (tx, rx) = mpsc::unbounded_channel();
    jobs.attach_completions(&tx);
    (jobs, rx)
}

async fn deliver_next(jobs: &mut SyncSet, rx: &mut mpsc::UnboundedReceiver<SupervisorEvent>) -> bool {
    match rx.recv().await {
        Some(SupervisorEvent::SyncFinished { job, run }) => jobs.on_sync_finished(job, run).await,
        other => panic!("expected SyncFinished, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn burst_during_copy_collapses_into_one_rerun() {
    init_tracing();
    let fake = FakeCopyBackend::new().with_delay(COPY_TIME);
    let (mut jobs, mut rx) = one_job(&fake);

    assert_eq!(jobs.notify(0), Some(NotifyDecision::LaunchNow));
    for _ in 0..20 {
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(jobs.notify(0), Some(NotifyDecision::AlreadyRunning));
    }
    assert_eq!(jobs.get(0).unwrap().state(), JobState::RunningWithPending);

    // First run completes: pending was set, so it relaunches at once.
    assert!(deliver_next(&mut jobs, &mut rx).await);
    assert_eq!(jobs.get(0).unwrap().state(), JobState::Running);

    // Second run completes with nothing pending.
    assert!(!deliver_next(&mut jobs, &mut rx).await);
    assert_eq!(jobs.get(0).unwrap().state(), JobState::Idle);

    assert_eq!(jobs.get(0).unwrap().runs_launched(), 2);
    assert_eq!(fake.copies_for(0), 2);
    assert_eq!(fake.max_concurrent(0), 1);
}

#[tokio::test(start_paused = true)]
async fn change_soon_after_a_run_waits_for_flush() {
    init_tracing();
    let fake = FakeCopyBackend::new().with_delay(COPY_TIME);
    let (mut jobs, mut rx) = one_job(&fake);

    jobs.notify(0);
    assert!(!deliver_next(&mut jobs, &mut rx).await);

    tokio::time::advance(Duration::from_secs(20)).await;
    assert_eq!(jobs.notify(0), Some(NotifyDecision::Debounced));
    assert_eq!(jobs.get(0).unwrap().state(), JobState::Pending);
    assert_eq!(jobs.get(0).unwrap().runs_launched(), 1);

    assert_eq!(jobs.sync_all_pending(), 1);
    assert_eq!(jobs.get(0).unwrap().runs_launched(), 2);
    assert_eq!(jobs.sync_all_pending(), 0);

    jobs.wait_all().await;
    assert_eq!(fake.copies_for(0), 2);
}

#[tokio::test(start_paused = true)]
async fn change_after_sync_delay_launches_immediately() {
    init_tracing();
    let fake = FakeCopyBackend::new().with_delay(COPY_TIME);
    let (mut jobs, mut rx) = one_job(&fake);

    jobs.notify(0);
    assert!(!deliver_next(&mut jobs, &mut rx).await);

    tokio::time::advance(SYNC_DELAY).await;
    assert_eq!(jobs.notify(0), Some(NotifyDecision::LaunchNow));
    jobs.wait_all().await;
    assert_eq!(jobs.get(0).unwrap().runs_launched(), 2);
}

#[tokio::test(start_paused = true)]
async fn forced_sync_waits_out_in_flight_copy_then_launches() {
    init_tracing();
    let fake = FakeCopyBackend::new().with_delay(COPY_TIME);
    let (mut jobs, _rx) = one_job(&fake);

    jobs.notify(0);
    let job = jobs.get_mut(0).unwrap();
    assert!(job.is_running());

    assert!(job.sync_if_needed(true).await);
    assert_eq!(job.runs_launched(), 2);
    job.wait_idle().await;

    // Forced even when nothing is pending and the job is idle.
    assert!(!job.is_pending());
    assert!(job.sync_if_needed(true).await);
    job.wait_idle().await;

    assert_eq!(fake.copies_for(0), 3);
    assert_eq!(fake.max_concurrent(0), 1);
}

#[tokio::test(start_paused = true)]
async fn unforced_sync_is_a_noop_without_pending_changes() {
    let fake = FakeCopyBackend::new();
    let (mut jobs, _rx) = one_job(&fake);

    assert!(!jobs.get_mut(0).unwrap().sync_if_needed(false).await);
    assert_eq!(fake.copies_for(0), 0);
}

#[tokio::test(start_paused = true)]
async fn sync_no_delay_during_copy_leaves_job_pending() {
    let fake = FakeCopyBackend::new().with_delay(COPY_TIME);
    let (mut jobs, mut rx) = one_job(&fake);

    let job = jobs.get_mut(0).unwrap();
    assert!(job.sync_no_delay());
    assert!(!job.sync_no_delay());
    assert_eq!(job.state(), JobState::RunningWithPending);

    assert!(deliver_next(&mut jobs, &mut rx).await);
    jobs.wait_all().await;
    assert_eq!(fake.copies_for(0), 2);
}

#[tokio::test(start_paused = true)]
async fn stale_completion_is_ignored() {
    let fake = FakeCopyBackend::new();
    let (mut jobs, _rx) = one_job(&fake);

    jobs.notify(0);
    jobs.wait_all().await;
    jobs.get_mut(0).unwrap().sync_no_delay();

    assert!(!jobs.on_sync_finished(0, 1).await);
    assert!(!jobs.on_sync_finished(7, 1).await);
    jobs.wait_all().await;
    assert_eq!(jobs.get(0).unwrap().runs_launched(), 2);
}

#[tokio::test(start_paused = true)]
async fn finish_runs_pending_work_before_returning() {
    let fake = FakeCopyBackend::new().with_delay(COPY_TIME);
    let (mut jobs, _rx) = one_job(&fake);

    jobs.notify(0);
    jobs.notify(0);
    jobs.finish().await;

    assert_eq!(fake.copies_for(0), 2);
    assert!(!jobs.get(0).unwrap().is_running());
    assert!(!jobs.get(0).unwrap().is_pending());
}
