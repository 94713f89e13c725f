// src/engine/mod.rs

//! Orchestration engine for simwatch.
//!
//! This module ties together:
//! - the watcher tree (root watcher + one child per device directory)
//! - the debounce scheduler that coalesces change bursts
//! - the runtime event loop that reacts to:
//!   - root and device change notifications
//!   - debounced reload firings
//!   - refresh requests
//!   - shutdown signals
//!
//! Every mutation of the tree and of the pending reload happens inside the
//! runtime loop, so watcher callbacks, reconciliation and rebuilds are
//! serialized without locks.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::WatchSection;
use crate::config::model::{DEFAULT_DEVICE_DELAY_MS, DEFAULT_ROOT_DELAY_MS};

pub use crate::types::{ReloadReason, WatchStatus};

/// Events flowing into the runtime from watchers, timers and signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The devices root listing changed.
    RootChanged,
    /// Something inside one device directory changed.
    DeviceChanged { path: PathBuf },
    /// A debounced reload elapsed.
    ReloadDue {
        ticket: Ticket,
        reason: ReloadReason,
    },
    /// Rebuild soon, and restart watching if it had failed.
    RefreshRequested,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Quiet periods used when scheduling reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadDelays {
    /// After a device-level change or a refresh request.
    pub device: Duration,
    /// After the root listing changed.
    pub root: Duration,
}

impl Default for ReloadDelays {
    fn default() -> Self {
        Self {
            device: Duration::from_millis(DEFAULT_DEVICE_DELAY_MS),
            root: Duration::from_millis(DEFAULT_ROOT_DELAY_MS),
        }
    }
}

impl From<&WatchSection> for ReloadDelays {
    fn from(section: &WatchSection) -> Self {
        Self {
            device: section.device_delay(),
            root: section.root_delay(),
        }
    }
}

pub mod backend;
pub mod debounce;
pub mod runtime;
pub mod tree;

pub use backend::RebuildBackend;
pub use debounce::{DebounceScheduler, Ticket};
pub use runtime::{Flow, Runtime};
pub use tree::{ReconcileReport, WatcherTree};
