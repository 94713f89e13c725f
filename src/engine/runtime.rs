// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, SimwatchError};
use crate::types::{ReloadReason, WatchStatus};

use super::backend::RebuildBackend;
use super::debounce::DebounceScheduler;
use super::tree::WatcherTree;
use super::{ReloadDelays, RuntimeEvent};

/// What the loop should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Drives the watcher tree and the debounce scheduler in response to
/// `RuntimeEvent`s, and delegates view rebuilding to a `RebuildBackend`.
///
/// This is the single consumer of the runtime channel: watcher callbacks
/// and debounce timers only send events, and everything that mutates the
/// tree or the pending reload happens in [`Runtime::handle`].
pub struct Runtime<B: RebuildBackend> {
    tree: WatcherTree,
    scheduler: DebounceScheduler<RuntimeEvent>,
    backend: B,
    delays: ReloadDelays,
    reported_status: WatchStatus,
}

impl<B: RebuildBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tree", &self.tree)
            .field("scheduler", &self.scheduler)
            .field("delays", &self.delays)
            .finish_non_exhaustive()
    }
}

impl<B: RebuildBackend> Runtime<B> {
    pub fn new(
        tree: WatcherTree,
        scheduler: DebounceScheduler<RuntimeEvent>,
        backend: B,
        delays: ReloadDelays,
    ) -> Self {
        Self {
            tree,
            scheduler,
            backend,
            delays,
            reported_status: WatchStatus::Stopped,
        }
    }

    pub fn tree(&self) -> &WatcherTree {
        &self.tree
    }

    pub fn scheduler(&self) -> &DebounceScheduler<RuntimeEvent> {
        &self.scheduler
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Main event loop.
    ///
    /// - Builds the view once and starts the watcher tree.
    /// - Consumes `RuntimeEvent`s from `event_rx` until shutdown or until
    ///   every sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::UnboundedReceiver<RuntimeEvent>) -> Result<()> {
        info!(root = ?self.tree.root_path(), "simwatch runtime started");

        self.invoke_backend(ReloadReason::Startup).await;
        self.start_watching();

        loop {
            let event = match event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            if self.handle(event).await == Flow::Exit {
                break;
            }
        }

        self.shutdown();
        info!("runtime exiting");
        Ok(())
    }

    /// Handle a single event. Reconciliation triggered by a root change has
    /// completed by the time this returns.
    pub async fn handle(&mut self, event: RuntimeEvent) -> Flow {
        debug!(?event, "runtime received event");

        match event {
            RuntimeEvent::RootChanged => {
                self.schedule_reload(self.delays.root, ReloadReason::RootChanged);
                self.tree.reconcile();
            }
            RuntimeEvent::DeviceChanged { path } => {
                debug!(?path, "device directory changed");
                self.schedule_reload(self.delays.device, ReloadReason::DeviceChanged);
            }
            RuntimeEvent::ReloadDue { ticket, reason } => {
                if self.scheduler.claim(ticket) {
                    self.rebuild_now(reason).await;
                }
            }
            RuntimeEvent::RefreshRequested => {
                if !self.tree.root_is_active() {
                    self.start_watching();
                }
                self.schedule_reload(self.delays.device, ReloadReason::Refresh);
            }
            RuntimeEvent::ShutdownRequested => {
                info!("shutdown requested");
                return Flow::Exit;
            }
        }

        Flow::Continue
    }

    /// Start the watcher tree. Failure leaves the tree degraded, not dead.
    pub fn start_watching(&mut self) {
        match self.tree.start() {
            Ok(report) => {
                debug!(watched = report.watched.len(), "watcher tree started");
            }
            Err(err) => {
                warn!(error = %err, "could not start watching the devices root");
            }
        }
        self.report_status();
    }

    /// The rebuild action: stop the root watcher, rebuild the view, then
    /// try to restart the root and re-sync the children.
    pub async fn rebuild_now(&mut self, reason: ReloadReason) {
        self.tree.stop_root();

        self.invoke_backend(reason).await;

        match self.tree.start_root() {
            Ok(()) => {
                // The root was blind while rebuilding.
                self.tree.reconcile();
            }
            Err(err) => {
                warn!(error = %err, "failed to restart root watcher after rebuild");
            }
        }
        self.report_status();
    }

    /// Cancel pending work and stop every watcher.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
        self.tree.stop();
        self.report_status();
    }

    fn schedule_reload(&mut self, delay: Duration, reason: ReloadReason) {
        self.scheduler
            .schedule_after(delay, move |ticket| RuntimeEvent::ReloadDue { ticket, reason });
    }

    async fn invoke_backend(&mut self, reason: ReloadReason) {
        info!(?reason, "rebuilding view");
        if let Err(source) = self.backend.rebuild().await {
            let err = SimwatchError::Rebuild(source);
            warn!(error = %err, ?reason, "rebuild failed; watching continues");
        }
    }

    fn report_status(&mut self) {
        let status = self.tree.status();
        if status == self.reported_status {
            return;
        }
        self.reported_status = status;

        if status.is_degraded() {
            error!(root = ?self.tree.root_path(), %status, "not watching the devices root");
        } else {
            info!(%status, "watch status changed");
        }
        self.backend.status_changed(status);
    }
}
