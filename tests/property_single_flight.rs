// tests/property_single_flight.rs

use std::sync::Arc;
use std::time::Duration;

use espsync::engine::SupervisorEvent;
use espsync::sync::{SyncSet, SyncSpec};
use espsync_test_utils::builders::timing;
use espsync_test_utils::fake_backend::FakeCopyBackend;
use proptest::prelude::*;
use tokio::sync::mpsc;

const JOBS: usize = 3;
const SYNC_DELAY: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
enum Op {
    Notify(usize),
    Advance(u64),
    DeliverCompletions,
    FlushPending,
    SyncNoDelay(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..JOBS).prop_map(Op::Notify),
        3 => (0u64..30_000).prop_map(Op::Advance),
        2 => Just(Op::DeliverCompletions),
        1 => Just(Op::FlushPending),
        1 => (0..JOBS).prop_map(Op::SyncNoDelay),
    ]
}

fn specs() -> Vec<SyncSpec> {
    (0..JOBS)
        .map(|i| SyncSpec::new(format!("/src{i}"), [format!("/dst{i}a"), format!("/dst{i}b")], Vec::<String>::new()))
        .collect()
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

async fn deliver(jobs: &mut SyncSet, rx: &mut mpsc::UnboundedReceiver<SupervisorEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let SupervisorEvent::SyncFinished { job, run } = event {
            jobs.on_sync_finished(job, run).await;
        }
    }
}

/// Replay `ops` against a fresh set of jobs; returns the highest observed
/// per-job copy overlap.
fn replay(ops: Vec<Op>, copy_time: Duration) -> usize {
    paused_runtime().block_on(async move {
        let fake = FakeCopyBackend::new().with_delay(copy_time);
        let mut jobs = SyncSet::new(&specs(), Arc::new(fake.clone()), &timing(SYNC_DELAY));
        let (tx, mut rx) = mpsc::unbounded_channel();
        jobs.attach_completions(&tx);

        for op in ops {
            match op {
                Op::Notify(job) => {
                    jobs.notify(job);
                }
                Op::Advance(ms) => {
                    tokio::time::advance(Duration::from_millis(ms)).await;
                    tokio::task::yield_now().await;
                }
                Op::DeliverCompletions => deliver(&mut jobs, &mut rx).await,
                Op::FlushPending => {
                    jobs.sync_all_pending();
                }
                Op::SyncNoDelay(job) => {
                    if let Some(j) = jobs.get_mut(job) {
                        j.sync_no_delay();
                    }
                }
            }
        }
        jobs.finish().await;

        (0..JOBS).map(|job| fake.max_concurrent(job)).max().unwrap_or(0)
    })
}

/// Notify bursts shorter than both the sync delay and the copy time, with
/// completions delivered as they arrive; returns launches per job.
fn burst(notifies: Vec<(usize, u64)>) -> Vec<u64> {
    paused_runtime().block_on(async move {
        let fake = FakeCopyBackend::new().with_delay(Duration::from_secs(400));
        let mut jobs = SyncSet::new(&specs(), Arc::new(fake.clone()), &timing(SYNC_DELAY));
        let (tx, mut rx) = mpsc::unbounded_channel();
        jobs.attach_completions(&tx);

        for (job, gap_ms) in notifies {
            tokio::time::advance(Duration::from_millis(gap_ms)).await;
            jobs.notify(job);
            deliver(&mut jobs, &mut rx).await;
        }
        jobs.finish().await;

        jobs.iter().map(|j| j.runs_launched()).collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn never_more_than_one_copy_in_flight_per_job(
        ops in proptest::collection::vec(op_strategy(), 1..80),
        copy_ms in 0u64..60_000,
    ) {
        let max = replay(ops, Duration::from_millis(copy_ms));
        prop_assert!(max <= 1, "observed {max} overlapping copies for one job");
    }

    #[test]
    fn burst_within_sync_delay_launches_at_most_twice(
        notifies in proptest::collection::vec((0..JOBS, 0u64..4_000), 1..60),
    ) {
        let touched: Vec<bool> = (0..JOBS)
            .map(|job| notifies.iter().any(|(j, _)| *j == job))
            .collect();

        let runs = burst(notifies);
        for (job, launched) in runs.into_iter().enumerate() {
            prop_assert!(launched <= 2, "job {job} launched {launched} times");
            prop_assert_eq!(launched >= 1, touched[job]);
        }
    }
}
