#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use simwatch::devices::APPLICATIONS_SUBPATH;
use simwatch::engine::{DebounceScheduler, ReloadDelays, Runtime, RuntimeEvent, WatcherTree};
use simwatch::fs::mock::MockFileSystem;
use simwatch::watch::{IgnorePatterns, WatcherFactory};

use crate::fake_source::FakeWatchSource;
use crate::recording_backend::RecordingBackend;

/// Create a device directory with the given application bundles on disk.
pub fn make_device(root: &Path, id: &str, apps: &[&str]) -> std::io::Result<PathBuf> {
    let device = root.join(id);
    std::fs::create_dir_all(&device)?;
    for (i, app) in apps.iter().enumerate() {
        let bundle = device
            .join(APPLICATIONS_SUBPATH)
            .join(format!("container-{i}"))
            .join(format!("{app}.app"));
        std::fs::create_dir_all(bundle)?;
    }
    Ok(device)
}

/// Same as [`make_device`] on a [`MockFileSystem`].
pub fn make_device_mock(fs: &MockFileSystem, root: &Path, id: &str, apps: &[&str]) -> PathBuf {
    let device = root.join(id);
    fs.add_dir(&device);
    for (i, app) in apps.iter().enumerate() {
        fs.add_dir(
            device
                .join(APPLICATIONS_SUBPATH)
                .join(format!("container-{i}"))
                .join(format!("{app}.app")),
        );
    }
    device
}

/// A runtime wired to a mock filesystem, a fake watch source and a
/// recording backend. Tests drive it event by event.
pub struct Harness {
    pub root: PathBuf,
    pub fs: MockFileSystem,
    pub source: FakeWatchSource,
    pub backend: RecordingBackend,
    pub runtime: Runtime<RecordingBackend>,
    pub tx: mpsc::UnboundedSender<RuntimeEvent>,
    pub rx: mpsc::UnboundedReceiver<RuntimeEvent>,
}

impl Harness {
    pub fn new(root: impl Into<PathBuf>, fs: MockFileSystem) -> Self {
        Self::with_parts(
            root,
            fs,
            FakeWatchSource::new(),
            RecordingBackend::new(),
            ReloadDelays::default(),
        )
    }

    pub fn with_parts(
        root: impl Into<PathBuf>,
        fs: MockFileSystem,
        source: FakeWatchSource,
        backend: RecordingBackend,
        delays: ReloadDelays,
    ) -> Self {
        let root = root.into();
        let (tx, rx) = mpsc::unbounded_channel();

        let factory = WatcherFactory::new(Arc::new(fs.clone()), Arc::new(source.clone()));
        let tree = WatcherTree::new(root.clone(), factory, IgnorePatterns::none(), tx.clone());
        let scheduler = DebounceScheduler::new(tx.clone());
        let runtime = Runtime::new(tree, scheduler, backend.clone(), delays);

        Self {
            root,
            fs,
            source,
            backend,
            runtime,
            tx,
            rx,
        }
    }

    /// Wait for the next event on the runtime channel.
    ///
    /// The limit is well above the default reload delays, so a paused-clock
    /// test never races its own timeout against a pending reload.
    pub async fn next_event(&mut self) -> RuntimeEvent {
        tokio::time::timeout(Duration::from_secs(60), self.rx.recv())
            .await
            .expect("no runtime event within 60s")
            .expect("runtime channel closed")
    }

    /// Receive the next event and feed it to the runtime.
    pub async fn pump(&mut self) -> RuntimeEvent {
        let event = self.next_event().await;
        self.runtime.handle(event.clone()).await;
        event
    }

    /// Feed every event that is already queued to the runtime.
    pub async fn pump_ready(&mut self) -> Vec<RuntimeEvent> {
        let mut handled = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            self.runtime.handle(event.clone()).await;
            handled.push(event);
        }
        handled
    }

    pub fn child_paths(&self) -> Vec<PathBuf> {
        self.runtime.tree().child_paths()
    }
}
