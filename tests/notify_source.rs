// tests/notify_source.rs

mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use simwatch::engine::{RuntimeEvent, WatcherTree};
use simwatch::fs::RealFileSystem;
use simwatch::watch::{IgnorePatterns, NotifyWatchSource, WatchSource, WatcherFactory};

/// Above the default Linux limit of 128 inotify instances per user.
const DEVICE_COUNT: usize = 200;

fn device_root(count: usize) -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let root = std::fs::canonicalize(dir.path())?;
    for i in 0..count {
        std::fs::create_dir(root.join(format!("device-{i:03}")))?;
    }
    Ok((dir, root))
}

async fn next_device_change(
    rx: &mut mpsc::UnboundedReceiver<RuntimeEvent>,
) -> Option<PathBuf> {
    while let Some(event) = rx.recv().await {
        if let RuntimeEvent::DeviceChanged { path } = event {
            return Some(path);
        }
    }
    None
}

#[tokio::test]
async fn hundreds_of_device_directories_are_all_watched() -> TestResult {
    init_tracing();
    let (_dir, root) = device_root(DEVICE_COUNT)?;
    let source = NotifyWatchSource::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let factory = WatcherFactory::new(Arc::new(RealFileSystem), Arc::new(source.clone()));
    let mut tree = WatcherTree::new(root.clone(), factory, IgnorePatterns::none(), tx);

    let report = tree.start()?;

    assert_eq!(report.watched.len(), DEVICE_COUNT);
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);
    assert_eq!(tree.active_children(), DEVICE_COUNT);
    assert_eq!(source.watched_dirs(), DEVICE_COUNT + 1);

    // Events reach the child that owns the changed directory.
    let device = root.join("device-150");
    std::fs::write(device.join("device.plist"), b"booted")?;
    assert_eq!(with_timeout(next_device_change(&mut rx)).await, Some(device));

    tree.stop();
    assert_eq!(source.watched_dirs(), 0);
    Ok(())
}

#[tokio::test]
async fn stopped_directories_no_longer_report_changes() -> TestResult {
    let (_dir, root) = device_root(3)?;
    let source = NotifyWatchSource::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let factory = WatcherFactory::new(Arc::new(RealFileSystem), Arc::new(source.clone()));
    let mut tree = WatcherTree::new(root.clone(), factory, IgnorePatterns::none(), tx);

    tree.start()?;
    tree.stop();
    while rx.try_recv().is_ok() {}

    std::fs::write(root.join("device-001").join("device.plist"), b"booted")?;
    std::fs::create_dir(root.join("device-new"))?;

    let next = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(next.is_err(), "unexpected event: {next:?}");
    Ok(())
}

#[tokio::test]
async fn shared_path_stays_watched_until_last_registration_drops() -> TestResult {
    let (_dir, root) = device_root(1)?;
    let device = root.join("device-000");
    let source = NotifyWatchSource::new();

    let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
    let first = {
        let tx = tx.clone();
        source.register(&device, Arc::new(move || {
            let _ = tx.send("first");
        }))?
    };
    let second = source.register(&device, Arc::new(move || {
        let _ = tx.send("second");
    }))?;
    assert_eq!(source.watched_dirs(), 1);

    drop(first);
    std::fs::write(device.join("a"), b"1")?;

    assert_eq!(with_timeout(rx.recv()).await, Some("second"));
    while let Ok(Some(name)) = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
        assert_eq!(name, "second");
    }

    drop(second);
    assert_eq!(source.watched_dirs(), 0);
    Ok(())
}
