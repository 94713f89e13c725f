// tests/directory_watcher.rs

mod common;
use crate::common::{init_tracing, with_timeout, FakeWatchSource, TestResult};

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use simwatch::errors::WatchStartError;
use simwatch::fs::mock::MockFileSystem;
use simwatch::fs::RealFileSystem;
use simwatch::watch::{ChangeCallback, DirectoryWatcher, NotifyWatchSource};

fn noop() -> ChangeCallback {
    Arc::new(|| {})
}

fn fake_watcher(fs: &MockFileSystem, source: &FakeWatchSource, path: &str) -> DirectoryWatcher {
    DirectoryWatcher::new(path, Arc::new(fs.clone()), Arc::new(source.clone()), noop())
}

#[test]
fn double_start_holds_a_single_registration() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/devices/A");
    let source = FakeWatchSource::new();

    let mut watcher = fake_watcher(&fs, &source, "/devices/A");
    watcher.start()?;
    watcher.start()?;

    assert!(watcher.is_active());
    assert_eq!(source.live_count("/devices/A"), 1);
    assert_eq!(source.total_registrations(), 1);
    Ok(())
}

#[test]
fn stop_is_idempotent_and_safe_before_start() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/devices/A");
    let source = FakeWatchSource::new();

    let mut watcher = fake_watcher(&fs, &source, "/devices/A");
    watcher.stop();
    assert!(!watcher.is_active());

    watcher.start()?;
    watcher.stop();
    watcher.stop();

    assert!(!watcher.is_active());
    assert_eq!(source.live_count("/devices/A"), 0);
    Ok(())
}

#[test]
fn watcher_can_restart_after_stop() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/devices/A");
    let source = FakeWatchSource::new();

    let mut watcher = fake_watcher(&fs, &source, "/devices/A");
    watcher.start()?;
    watcher.stop();
    watcher.start()?;

    assert!(watcher.is_active());
    assert_eq!(source.live_count("/devices/A"), 1);
    assert_eq!(source.total_registrations(), 2);
    assert!(source.duplicate_violations().is_empty());
    Ok(())
}

#[test]
fn missing_path_fails_with_missing() {
    let fs = MockFileSystem::new();
    let source = FakeWatchSource::new();

    let mut watcher = fake_watcher(&fs, &source, "/devices/gone");
    match watcher.start() {
        Err(WatchStartError::Missing(path)) => assert_eq!(path, Path::new("/devices/gone")),
        other => panic!("expected Missing, got {other:?}"),
    }
    assert!(!watcher.is_active());
    assert_eq!(source.total_registrations(), 0);
}

#[test]
fn file_path_fails_with_not_a_directory() {
    let fs = MockFileSystem::new();
    fs.add_file("/devices/device_set.plist");
    let source = FakeWatchSource::new();

    let mut watcher = fake_watcher(&fs, &source, "/devices/device_set.plist");
    assert!(matches!(
        watcher.start(),
        Err(WatchStartError::NotADirectory(_))
    ));
    assert!(!watcher.is_active());
}

#[test]
fn registration_failure_leaves_watcher_stopped_until_retry() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/devices/A");
    let source = FakeWatchSource::new();
    source.fail_on("/devices/A");

    let mut watcher = fake_watcher(&fs, &source, "/devices/A");
    let err = watcher.start().expect_err("registration should fail");
    assert!(matches!(err, WatchStartError::Register { .. }));
    assert_eq!(err.path(), Path::new("/devices/A"));
    assert!(!watcher.is_active());

    source.stop_failing("/devices/A");
    watcher.start()?;
    assert!(watcher.is_active());
    Ok(())
}

#[test]
fn dropping_an_active_watcher_releases_its_registration() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/devices/A");
    let source = FakeWatchSource::new();

    {
        let mut watcher = fake_watcher(&fs, &source, "/devices/A");
        watcher.start()?;
        assert_eq!(source.live_count("/devices/A"), 1);
    }

    assert_eq!(source.live_count("/devices/A"), 0);
    Ok(())
}

#[test]
fn callback_runs_once_per_delivered_batch_while_active() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_dir("/devices/A");
    let source = FakeWatchSource::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut watcher = DirectoryWatcher::new(
        "/devices/A",
        Arc::new(fs.clone()),
        Arc::new(source.clone()),
        {
            let calls = Arc::clone(&calls);
            Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        },
    );

    watcher.start()?;
    source.fire("/devices/A");
    source.fire("/devices/A");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    watcher.stop();
    assert_eq!(source.fire("/devices/A"), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn notify_backed_watcher_reports_new_entries() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();

    let mut watcher = DirectoryWatcher::new(
        dir.path(),
        Arc::new(RealFileSystem),
        Arc::new(NotifyWatchSource::new()),
        Arc::new(move || {
            let _ = tx.send(());
        }),
    );
    watcher.start()?;
    watcher.start()?;

    std::fs::create_dir(dir.path().join("new-device"))?;

    with_timeout(rx.recv()).await.expect("change callback");
    watcher.stop();
    Ok(())
}

#[test]
fn notify_backed_watcher_rejects_missing_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("nope");

    let mut watcher = DirectoryWatcher::new(
        &missing,
        Arc::new(RealFileSystem),
        Arc::new(NotifyWatchSource::new()),
        noop(),
    );

    assert!(matches!(watcher.start(), Err(WatchStartError::Missing(_))));
    Ok(())
}
