// src/watch/source.rs

//! OS watch registration seam.
//!
//! A [`DirectoryWatcher`](super::DirectoryWatcher) never talks to `notify`
//! directly; it asks a [`WatchSource`] for a registration and holds on to
//! the returned guard for as long as it is active. Dropping the guard
//! releases the OS handle.
//!
//! - [`NotifyWatchSource`] is the production implementation. Every
//!   registration shares one `notify::RecommendedWatcher`, so a devices
//!   root with hundreds of simulators still costs a single inotify
//!   instance (and a single event thread) on Linux.
//! - Tests can provide a source that counts live registrations and fires
//!   callbacks on demand.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

/// Callback invoked once per batch of OS change events.
///
/// Called from whatever thread the OS layer delivers on, so it must only
/// hand the notification off (e.g. send on a channel).
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// A live OS-level watch. Dropping it releases the handle.
pub trait WatchRegistration: Send + fmt::Debug {}

/// Factory for OS-level watch registrations.
pub trait WatchSource: Send + Sync + fmt::Debug {
    /// Register a non-recursive watch on `path`.
    fn register(
        &self,
        path: &Path,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn WatchRegistration>, notify::Error>;
}

/// Callbacks keyed by watched directory.
type Routes = HashMap<PathBuf, Vec<(u64, ChangeCallback)>>;

struct Shared {
    config: Config,
    /// Created on first registration.
    watcher: Mutex<Option<RecommendedWatcher>>,
    routes: Arc<Mutex<Routes>>,
    next_id: AtomicU64,
}

/// Production source backed by one shared `notify` watcher.
///
/// Clones share the watcher.
#[derive(Clone)]
pub struct NotifyWatchSource {
    shared: Arc<Shared>,
}

impl fmt::Debug for NotifyWatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyWatchSource")
            .field("watched", &lock(&self.shared.routes).len())
            .finish_non_exhaustive()
    }
}

impl Default for NotifyWatchSource {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl NotifyWatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                watcher: Mutex::new(None),
                routes: Arc::new(Mutex::new(HashMap::new())),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Number of directories currently registered with the OS watcher.
    pub fn watched_dirs(&self) -> usize {
        lock(&self.shared.routes).len()
    }
}

impl WatchSource for NotifyWatchSource {
    fn register(
        &self,
        path: &Path,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn WatchRegistration>, notify::Error> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let watched = path.to_path_buf();

        // Route first so events arriving right after `watch` are not lost.
        lock(&self.shared.routes)
            .entry(watched.clone())
            .or_default()
            .push((id, on_change));

        // The routes lock must not be held here: `watch` waits on the event
        // thread, which takes that lock to dispatch.
        if let Err(err) = self.shared.watch(&watched) {
            remove_route(&self.shared.routes, &watched, id);
            return Err(err);
        }

        debug!(path = ?watched, "registered directory with shared watcher");
        Ok(Box::new(NotifyRegistration {
            id,
            path: watched,
            shared: Arc::clone(&self.shared),
        }))
    }
}

impl Shared {
    fn watch(&self, path: &Path) -> notify::Result<()> {
        let mut guard = lock(&self.watcher);
        let watcher = match guard.take() {
            Some(watcher) => watcher,
            None => RecommendedWatcher::new(event_handler(Arc::clone(&self.routes)), self.config)?,
        };
        guard.insert(watcher).watch(path, RecursiveMode::NonRecursive)
    }

    fn unwatch(&self, path: &Path) {
        let mut guard = lock(&self.watcher);
        let Some(watcher) = guard.as_mut() else {
            return;
        };
        // A deleted directory has already lost its OS watch.
        if let Err(err) = watcher.unwatch(path) {
            debug!(?path, error = %err, "unwatch failed");
        }
    }
}

fn event_handler(routes: Arc<Mutex<Routes>>) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !is_change(&event.kind) {
                return;
            }
            let callbacks = callbacks_for(&lock(&routes), &event);
            trace!(?event, callbacks = callbacks.len(), "change event");
            for cb in callbacks {
                cb();
            }
        }
        Err(err) => {
            warn!(paths = ?err.paths, error = %err, "file watch error");
        }
    }
}

/// Callbacks of every watched directory an event belongs to: the directory
/// containing each reported path, plus the path itself when it is watched
/// (events on the directory's own inode). Each callback runs at most once
/// per event.
fn callbacks_for(routes: &Routes, event: &Event) -> Vec<ChangeCallback> {
    let mut seen = Vec::new();
    let mut callbacks = Vec::new();

    for path in &event.paths {
        let owners = path.parent().into_iter().chain(std::iter::once(path.as_path()));
        for dir in owners {
            let Some(regs) = routes.get(dir) else {
                continue;
            };
            for (id, cb) in regs {
                if !seen.contains(id) {
                    seen.push(*id);
                    callbacks.push(Arc::clone(cb));
                }
            }
        }
    }
    callbacks
}

/// Open/read/close notifications do not change the listing or contents.
fn is_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

/// Returns true if this was the last registration for `path`.
fn remove_route(routes: &Mutex<Routes>, path: &Path, id: u64) -> bool {
    let mut routes = lock(routes);
    let Some(regs) = routes.get_mut(path) else {
        return false;
    };
    regs.retain(|(reg_id, _)| *reg_id != id);
    if regs.is_empty() {
        routes.remove(path);
        true
    } else {
        false
    }
}

/// Callbacks never run under these locks, so a poisoned lock still holds
/// consistent data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One directory's share of the watcher; dropping it unwatches the
/// directory once no other registration needs it.
struct NotifyRegistration {
    id: u64,
    path: PathBuf,
    shared: Arc<Shared>,
}

impl fmt::Debug for NotifyRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyRegistration")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

impl WatchRegistration for NotifyRegistration {}

impl Drop for NotifyRegistration {
    fn drop(&mut self) {
        if remove_route(&self.shared.routes, &self.path, self.id) {
            self.shared.unwatch(&self.path);
            trace!(path = ?self.path, "unwatched directory");
        }
    }
}
