// tests/notify_end_to_end.rs

mod common;
use crate::common::{
    eventually, init_tracing, make_device, with_timeout, RecordingBackend, TestResult,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use simwatch::engine::{DebounceScheduler, ReloadDelays, Runtime, RuntimeEvent, WatcherTree};
use simwatch::fs::RealFileSystem;
use simwatch::watch::{IgnorePatterns, NotifyWatchSource, WatcherFactory};

async fn wait_for_rebuilds(backend: &RecordingBackend, at_least: usize) {
    eventually(|| backend.rebuilds() >= at_least).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn real_directory_changes_trigger_rebuilds() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = std::fs::canonicalize(dir.path())?;
    make_device(&root, "deviceA", &["Safari"])?;

    let (tx, rx) = mpsc::unbounded_channel();
    let factory = WatcherFactory::new(Arc::new(RealFileSystem), Arc::new(NotifyWatchSource::new()));
    let tree = WatcherTree::new(root.clone(), factory, IgnorePatterns::none(), tx.clone());
    let scheduler = DebounceScheduler::new(tx.clone());
    let backend = RecordingBackend::new();
    let delays = ReloadDelays {
        device: Duration::from_millis(50),
        root: Duration::from_millis(150),
    };

    let handle = tokio::spawn(Runtime::new(tree, scheduler, backend.clone(), delays).run(rx));

    // Startup build.
    wait_for_rebuilds(&backend, 1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // A new device directory changes the root listing.
    make_device(&root, "deviceB", &[])?;
    wait_for_rebuilds(&backend, 2).await;

    // Let the post-rebuild reconciliation settle, then touch a device.
    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(root.join("deviceB").join("device.plist"), b"booted")?;
    wait_for_rebuilds(&backend, 3).await;

    tx.send(RuntimeEvent::ShutdownRequested)?;
    with_timeout(handle).await??;
    Ok(())
}
