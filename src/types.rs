// src/types.rs

use std::fmt;

/// Watching health of the devices root, as surfaced to the view layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchStatus {
    /// Not started yet, or shut down.
    #[default]
    Stopped,
    /// Root watcher active.
    Watching,
    /// The root watcher could not be (re)started `failures` times in a row.
    /// Nothing is being watched until the next successful start.
    Degraded { failures: u32 },
}

impl WatchStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, WatchStatus::Degraded { .. })
    }

    /// Status after one more failed attempt to start the root watcher.
    pub fn after_failure(self) -> Self {
        match self {
            WatchStatus::Degraded { failures } => WatchStatus::Degraded {
                failures: failures.saturating_add(1),
            },
            _ => WatchStatus::Degraded { failures: 1 },
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchStatus::Stopped => write!(f, "stopped"),
            WatchStatus::Watching => write!(f, "watching"),
            WatchStatus::Degraded { failures } => {
                write!(f, "degraded ({failures} failed start attempts)")
            }
        }
    }
}

/// Why a rebuild was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// First build at launch.
    Startup,
    /// The devices root listing changed.
    RootChanged,
    /// Something inside a device directory changed.
    DeviceChanged,
    /// Explicit refresh request (menu item or SIGHUP).
    Refresh,
}
