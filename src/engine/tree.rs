// src/engine/tree.rs

//! The two-level watcher tree.
//!
//! One root watcher over the devices directory, plus one child watcher per
//! immediate subdirectory. The child set is a snapshot of the root listing
//! taken whenever [`WatcherTree::reconcile`] runs; reconciliation stops
//! every existing child before creating any new one, so no two watchers
//! ever exist for the same path.
//!
//! Watcher callbacks never touch the tree. They only send
//! [`RuntimeEvent`]s, and the runtime loop calls back into the tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{SimwatchError, WatchStartError};
use crate::types::WatchStatus;
use crate::watch::{DirectoryWatcher, IgnorePatterns, WatcherFactory};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Child watchers stopped before the new set was built.
    pub stopped: usize,
    /// Paths that now have an active child watcher.
    pub watched: Vec<PathBuf>,
    /// Entries left without a watcher (files, ignored names, failed starts).
    pub skipped: Vec<PathBuf>,
    /// The root could not be listed; the child set is empty.
    pub listing_failed: bool,
}

pub struct WatcherTree {
    factory: WatcherFactory,
    ignore: IgnorePatterns,
    events: mpsc::UnboundedSender<RuntimeEvent>,
    root: DirectoryWatcher,
    children: BTreeMap<PathBuf, DirectoryWatcher>,
    status: WatchStatus,
}

impl std::fmt::Debug for WatcherTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherTree")
            .field("root", &self.root)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl WatcherTree {
    /// Build a stopped tree over `root_path`.
    ///
    /// The root path is fixed for the lifetime of the tree.
    pub fn new(
        root_path: impl Into<PathBuf>,
        factory: WatcherFactory,
        ignore: IgnorePatterns,
        events: mpsc::UnboundedSender<RuntimeEvent>,
    ) -> Self {
        let root_tx = events.clone();
        let root = factory.watcher(
            root_path,
            Arc::new(move || {
                let _ = root_tx.send(RuntimeEvent::RootChanged);
            }),
        );

        Self {
            factory,
            ignore,
            events,
            root,
            children: BTreeMap::new(),
            status: WatchStatus::Stopped,
        }
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    pub fn root_is_active(&self) -> bool {
        self.root.is_active()
    }

    pub fn status(&self) -> WatchStatus {
        self.status
    }

    /// Paths of the current child watchers, sorted.
    pub fn child_paths(&self) -> Vec<PathBuf> {
        self.children.keys().cloned().collect()
    }

    /// Number of child watchers currently holding a registration.
    pub fn active_children(&self) -> usize {
        self.children.values().filter(|w| w.is_active()).count()
    }

    /// Start the root watcher and, on success, reconcile children.
    pub fn start(&mut self) -> Result<ReconcileReport, WatchStartError> {
        self.start_root()?;
        Ok(self.reconcile())
    }

    /// Stop the root and every child watcher.
    pub fn stop(&mut self) {
        self.root.stop();
        self.stop_children();
        self.status = WatchStatus::Stopped;
        info!(root = ?self.root.path(), "watcher tree stopped");
    }

    /// Start only the root watcher, recording the outcome in [`status`](Self::status).
    pub fn start_root(&mut self) -> Result<(), WatchStartError> {
        match self.root.start() {
            Ok(()) => {
                self.status = WatchStatus::Watching;
                Ok(())
            }
            Err(err) => {
                self.status = self.status.after_failure();
                Err(err)
            }
        }
    }

    /// Stop only the root watcher. Children keep running.
    pub fn stop_root(&mut self) {
        self.root.stop();
    }

    /// Replace the child set with one watcher per subdirectory of the root.
    ///
    /// Never fails: a root that cannot be listed leaves the child set empty
    /// until the next reconciliation.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let mut report = ReconcileReport {
            stopped: self.stop_children(),
            ..ReconcileReport::default()
        };

        let root_path = self.root.path().to_path_buf();
        let entries = match self.factory.fs().read_dir(&root_path) {
            Ok(entries) => entries,
            Err(source) => {
                let err = SimwatchError::Listing {
                    path: root_path,
                    source,
                };
                warn!(error = %err, "reconciliation found no devices");
                report.listing_failed = true;
                return report;
            }
        };

        for path in entries {
            if self.ignore.is_ignored(&path) {
                debug!(?path, "ignoring entry by pattern");
                report.skipped.push(path);
                continue;
            }
            if !self.factory.fs().is_dir(&path) {
                report.skipped.push(path);
                continue;
            }

            let mut child = self.child_watcher(&path);
            match child.start() {
                Ok(()) => {
                    report.watched.push(path.clone());
                    self.children.insert(path, child);
                }
                Err(err @ WatchStartError::Register { .. }) => {
                    warn!(?path, error = %err, "device directory left unwatched");
                    report.skipped.push(path);
                }
                Err(err) => {
                    // Removed or replaced since the listing was taken.
                    debug!(?path, error = %err, "skipping device directory");
                    report.skipped.push(path);
                }
            }
        }

        info!(
            root = ?self.root.path(),
            watched = report.watched.len(),
            skipped = report.skipped.len(),
            "reconciled device watchers"
        );
        report
    }

    fn child_watcher(&self, path: &Path) -> DirectoryWatcher {
        let tx = self.events.clone();
        let device = path.to_path_buf();
        self.factory.watcher(
            path,
            Arc::new(move || {
                let _ = tx.send(RuntimeEvent::DeviceChanged {
                    path: device.clone(),
                });
            }),
        )
    }

    /// Stop and drop every child; returns how many there were.
    fn stop_children(&mut self) -> usize {
        let children = std::mem::take(&mut self.children);
        let count = children.len();
        for (_, mut watcher) in children {
            watcher.stop();
        }
        count
    }
}
