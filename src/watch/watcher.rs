// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::WatchStartError;
use crate::fs::FileSystem;
use crate::watch::source::{ChangeCallback, WatchRegistration, WatchSource};

/// Observes a single directory and invokes a callback when it changes.
///
/// States: `Stopped` (no registration held) and `Active` (exactly one
/// registration held). A watcher starts out stopped, may be started and
/// stopped any number of times, and releases its registration on drop.
pub struct DirectoryWatcher {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    source: Arc<dyn WatchSource>,
    on_change: ChangeCallback,
    registration: Option<Box<dyn WatchRegistration>>,
}

impl fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl DirectoryWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn WatchSource>,
        on_change: ChangeCallback,
    ) -> Self {
        Self {
            path: path.into(),
            fs,
            source,
            on_change,
            registration: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.registration.is_some()
    }

    /// Begin observing the directory.
    ///
    /// A no-op when already active. On failure the watcher stays stopped.
    pub fn start(&mut self) -> Result<(), WatchStartError> {
        if self.is_active() {
            return Ok(());
        }

        if !self.fs.exists(&self.path) {
            return Err(WatchStartError::Missing(self.path.clone()));
        }
        if !self.fs.is_dir(&self.path) {
            return Err(WatchStartError::NotADirectory(self.path.clone()));
        }

        let registration = self
            .source
            .register(&self.path, Arc::clone(&self.on_change))
            .map_err(|source| WatchStartError::Register {
                path: self.path.clone(),
                source,
            })?;

        self.registration = Some(registration);
        debug!(path = ?self.path, "directory watcher started");
        Ok(())
    }

    /// Release the registration if held. Safe to call at any time.
    pub fn stop(&mut self) {
        if self.registration.take().is_some() {
            debug!(path = ?self.path, "directory watcher stopped");
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared ingredients for building [`DirectoryWatcher`]s.
#[derive(Debug, Clone)]
pub struct WatcherFactory {
    fs: Arc<dyn FileSystem>,
    source: Arc<dyn WatchSource>,
}

impl WatcherFactory {
    pub fn new(fs: Arc<dyn FileSystem>, source: Arc<dyn WatchSource>) -> Self {
        Self { fs, source }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Create a stopped watcher for `path`.
    pub fn watcher(&self, path: impl Into<PathBuf>, on_change: ChangeCallback) -> DirectoryWatcher {
        DirectoryWatcher::new(path, Arc::clone(&self.fs), Arc::clone(&self.source), on_change)
    }
}
