// src/engine/signals.rs

//! Termination signal wiring.

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::ShutdownHandle;
use crate::errors::Result;

/// Listen for SIGINT, SIGTERM, SIGHUP, SIGQUIT and SIGABRT; any of them
/// triggers `shutdown`. Registration happens before this returns, so a
/// signal arriving afterwards is never missed.
pub fn register_signal_handlers(shutdown: ShutdownHandle) -> Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut abort = signal(SignalKind::from_raw(libc::SIGABRT))?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = interrupt.recv() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
                _ = hangup.recv() => "SIGHUP",
                _ = quit.recv() => "SIGQUIT",
                _ = abort.recv() => "SIGABRT",
            };
            info!(signal = name, "signal received; shutting down");
            if !shutdown.trigger() {
                break;
            }
        }
    }))
}
