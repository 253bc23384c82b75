// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod sync;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::{CliArgs, Mode};
use crate::config::{check_sync_list, load_and_validate, ConfigFile};
use crate::engine::{register_signal_handlers, WatchSupervisor};
use crate::exec::ProcessCopyBackend;
use crate::fs::RealFileSystem;
use crate::sync::SyncSet;
use crate::watch::watch_args;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the filesystem sanity check
/// - process priority
/// - the sync jobs and their copy backend
/// - (daemon mode) the watch supervisor and signal handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    cfg.copy.test_mode = args.test;
    cfg.copy.quiet = args.quiet;

    check_sync_list(&cfg.sync_list, &RealFileSystem)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    match args.mode() {
        Mode::List => {
            print_jobs(&cfg);
            Ok(())
        }
        Mode::Once => run_once(&cfg).await,
        Mode::Daemon => run_daemon(&cfg).await,
    }
}

/// Build the job registry with the real copy backend.
pub fn build_sync_set(cfg: &ConfigFile) -> SyncSet {
    let backend = Arc::new(ProcessCopyBackend::new(cfg.copy.clone()));
    SyncSet::new(&cfg.sync_list, backend, &cfg.timing)
}

/// Forced sync of every job, then wait for all copies.
pub async fn run_once(cfg: &ConfigFile) -> Result<()> {
    cfg.priority.apply();
    let mut jobs = build_sync_set(cfg);
    jobs.sync_all().await;
    jobs.wait_all().await;
    info!(jobs = jobs.len(), "sync complete");
    Ok(())
}

/// Initial forced sync, then watch every source until a signal arrives or
/// no watcher is left. Copies still pending or in flight at that point are
/// completed before returning.
pub async fn run_daemon(cfg: &ConfigFile) -> Result<()> {
    cfg.priority.apply();

    let jobs = build_sync_set(cfg);
    let mut supervisor =
        WatchSupervisor::new(jobs, cfg.watch_tool.clone(), cfg.timing.flush_interval);
    let signals = register_signal_handlers(supervisor.shutdown_handle())?;

    supervisor.jobs_mut().sync_all().await;

    let ids: Vec<_> = supervisor.jobs().ids().collect();
    for job in ids {
        supervisor.add_watch(job)?;
    }
    supervisor.start_all();

    let result = supervisor.run().await;
    signals.abort();

    let mut jobs = supervisor.into_jobs();
    jobs.finish().await;

    result.map_err(Into::into)
}

fn print_jobs(cfg: &ConfigFile) {
    println!("espsync: {} sync job(s)", cfg.sync_list.len());
    for (id, spec) in cfg.sync_list.iter().enumerate() {
        println!("  [{id}] {}", spec.source.display());
        for dest in &spec.destinations {
            println!("      -> {}", dest.display());
        }
        if !spec.exclusions.is_empty() {
            println!("      exclude: {:?}", spec.exclusions);
        }
    }
}

/// Print every command the daemon would run, without running any.
fn print_dry_run(cfg: &ConfigFile) {
    println!("espsync dry-run");
    println!("  sync_delay = {:?}", cfg.timing.sync_delay);
    println!("  flush_interval = {:?}", cfg.timing.flush_interval);
    println!(
        "  nice = {}, io_class = {:?}, io_level = {}",
        cfg.priority.nice, cfg.priority.io_class, cfg.priority.io_level
    );
    println!();

    for (id, spec) in cfg.sync_list.iter().enumerate() {
        println!("job {id}:");
        println!(
            "  watch: {}",
            cfg.watch_tool.display_with(&watch_args(&spec.source))
        );
        for dest in &spec.destinations {
            let args = cfg.copy.copy_args(&spec.source, dest, &spec.exclusions);
            println!("  copy:  {}", cfg.copy.tool.display_with(&args));
        }
    }

    debug!("dry-run complete (no execution)");
}
