// src/exec/prio.rs

//! Process niceness and I/O priority.
//!
//! Applied to the daemon itself before any copy runs, so every spawned copy
//! tool inherits them.

use std::io;

use tracing::{debug, warn};

const IOPRIO_CLASS_SHIFT: i32 = 13;
const IOPRIO_WHO_PROCESS: i32 = 1;

/// I/O scheduling class, numbered as in `ionice(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoClass {
    None,
    Realtime,
    BestEffort,
    Idle,
}

impl IoClass {
    fn from_number(n: i32) -> Self {
        match n {
            1 => IoClass::Realtime,
            2 => IoClass::BestEffort,
            3 => IoClass::Idle,
            _ => IoClass::None,
        }
    }

    fn number(self) -> i32 {
        match self {
            IoClass::None => 0,
            IoClass::Realtime => 1,
            IoClass::BestEffort => 2,
            IoClass::Idle => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority {
    pub nice: i32,
    pub io_class: IoClass,
    /// 0 (highest) to 7; only meaningful for realtime and best-effort.
    pub io_level: i32,
}

impl Priority {
    /// Out-of-range values are clamped rather than rejected.
    pub fn new(nice: i32, io_class: i32, io_level: i32) -> Self {
        Self {
            nice: nice.clamp(-20, 19),
            io_class: IoClass::from_number(io_class.clamp(0, 3)),
            io_level: io_level.clamp(0, 7),
        }
    }

    /// `ioprio_set` value for this class/level.
    pub fn ioprio_value(&self) -> i32 {
        let level = match self.io_class {
            IoClass::Realtime | IoClass::BestEffort => self.io_level,
            IoClass::None | IoClass::Idle => 0,
        };
        (self.io_class.number() << IOPRIO_CLASS_SHIFT) | level
    }

    /// Apply to the current process. Failures are logged, never fatal.
    pub fn apply(&self) {
        if let Err(err) = set_nice(self.nice) {
            warn!(nice = self.nice, error = %err, "failed to set niceness");
        }
        if let Err(err) = set_ioprio(self.ioprio_value()) {
            warn!(io_class = ?self.io_class, io_level = self.io_level, error = %err, "failed to set I/O priority");
        }
        debug!(priority = ?self, "process priority applied");
    }
}

fn set_nice(nice: i32) -> io::Result<()> {
    // SAFETY: plain syscall on the calling process, no pointers involved.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, nice) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_ioprio(value: i32) -> io::Result<()> {
    // SAFETY: ioprio_set(which, who, ioprio) takes only integers; who=0 is self.
    let rc = unsafe { libc::syscall(libc::SYS_ioprio_set, IOPRIO_WHO_PROCESS, 0, value) };
    if rc == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
