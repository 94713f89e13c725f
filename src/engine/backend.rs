// src/engine/backend.rs

//! Pluggable rebuild backend abstraction.
//!
//! The runtime does not know how the view is computed. Once a debounced
//! reload settles it awaits [`RebuildBackend::rebuild`], and only then
//! restarts the root watcher.
//!
//! - `ViewRebuilder` (in [`crate::view`]) is the production implementation:
//!   it snapshots the devices root and publishes a menu tree.
//! - Tests provide their own backend that, for example, counts rebuilds or
//!   fails on demand.

use std::future::Future;
use std::pin::Pin;

use crate::types::WatchStatus;

/// Trait abstracting the work performed when a reload fires.
pub trait RebuildBackend: Send {
    /// Recompute and republish the derived view.
    ///
    /// The returned future must complete before watching resumes. Errors
    /// are logged by the runtime and never stop the watch loop.
    fn rebuild(&mut self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Called whenever the watching status changes (e.g. to show a degraded
    /// indicator).
    fn status_changed(&mut self, _status: WatchStatus) {}
}
