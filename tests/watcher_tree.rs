// tests/watcher_tree.rs

mod common;
use crate::common::{init_tracing, make_device_mock, FakeWatchSource, Harness, TestResult};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use simwatch::engine::{RuntimeEvent, WatchStatus, WatcherTree};
use simwatch::errors::WatchStartError;
use simwatch::fs::mock::MockFileSystem;
use simwatch::watch::{IgnorePatterns, WatcherFactory};

const ROOT: &str = "/sim/Devices";

fn p(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

fn two_devices() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(ROOT);
    fs.add_dir(p("deviceA"));
    fs.add_dir(p("deviceB"));
    fs.add_file(p("device_set.plist"));
    fs
}

fn tree_with(
    fs: &MockFileSystem,
    source: &FakeWatchSource,
    ignore: IgnorePatterns,
) -> (WatcherTree, mpsc::UnboundedReceiver<RuntimeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let factory = WatcherFactory::new(Arc::new(fs.clone()), Arc::new(source.clone()));
    (WatcherTree::new(ROOT, factory, ignore, tx), rx)
}

#[test]
fn start_creates_one_child_per_device_directory() -> TestResult {
    init_tracing();
    let fs = two_devices();
    let source = FakeWatchSource::new();
    let (mut tree, _rx) = tree_with(&fs, &source, IgnorePatterns::none());

    let report = tree.start()?;

    assert_eq!(tree.child_paths(), vec![p("deviceA"), p("deviceB")]);
    assert_eq!(report.watched, vec![p("deviceA"), p("deviceB")]);
    assert_eq!(report.skipped, vec![p("device_set.plist")]);
    assert!(!report.listing_failed);
    assert_eq!(tree.status(), WatchStatus::Watching);

    let expected: BTreeSet<PathBuf> =
        [PathBuf::from(ROOT), p("deviceA"), p("deviceB")].into_iter().collect();
    assert_eq!(source.live_paths(), expected);
    Ok(())
}

#[test]
fn reconcile_stops_old_children_before_creating_new_ones() -> TestResult {
    let fs = two_devices();
    let source = FakeWatchSource::new();
    let (mut tree, _rx) = tree_with(&fs, &source, IgnorePatterns::none());

    tree.start()?;
    for _ in 0..3 {
        let report = tree.reconcile();
        assert_eq!(report.stopped, 2);
    }

    assert!(source.duplicate_violations().is_empty());
    // Root once, plus two children per reconciliation (start + 3 explicit).
    assert_eq!(source.total_registrations(), 1 + 2 * 4);
    assert_eq!(source.live_count(p("deviceA")), 1);
    assert_eq!(tree.active_children(), 2);
    Ok(())
}

#[test]
fn children_that_fail_to_start_are_skipped() -> TestResult {
    let fs = two_devices();
    let source = FakeWatchSource::new();
    source.fail_on(p("deviceB"));
    let (mut tree, _rx) = tree_with(&fs, &source, IgnorePatterns::none());

    let report = tree.start()?;

    assert_eq!(tree.child_paths(), vec![p("deviceA")]);
    assert!(report.skipped.contains(&p("deviceB")));
    Ok(())
}

#[test]
fn ignored_names_get_no_child_watcher() -> TestResult {
    let fs = two_devices();
    fs.add_dir(p(".staging"));
    let source = FakeWatchSource::new();
    let ignore = IgnorePatterns::from_patterns(&[".*".to_string()])?;
    let (mut tree, _rx) = tree_with(&fs, &source, ignore);

    tree.start()?;

    assert_eq!(tree.child_paths(), vec![p("deviceA"), p("deviceB")]);
    assert_eq!(source.live_count(p(".staging")), 0);
    Ok(())
}

#[test]
fn missing_root_fails_start_and_degrades() {
    let fs = MockFileSystem::new();
    let source = FakeWatchSource::new();
    let (mut tree, _rx) = tree_with(&fs, &source, IgnorePatterns::none());

    assert!(matches!(tree.start(), Err(WatchStartError::Missing(_))));
    assert!(matches!(tree.start(), Err(WatchStartError::Missing(_))));

    assert_eq!(tree.status(), WatchStatus::Degraded { failures: 2 });
    assert!(tree.child_paths().is_empty());
    assert!(!tree.root_is_active());
}

#[test]
fn stop_releases_every_registration() -> TestResult {
    let fs = two_devices();
    let source = FakeWatchSource::new();
    let (mut tree, _rx) = tree_with(&fs, &source, IgnorePatterns::none());

    tree.start()?;
    tree.stop();
    tree.stop();

    assert!(source.live_paths().is_empty());
    assert!(tree.child_paths().is_empty());
    assert_eq!(tree.status(), WatchStatus::Stopped);
    Ok(())
}

#[test]
fn watcher_callbacks_only_send_events() -> TestResult {
    let fs = two_devices();
    let source = FakeWatchSource::new();
    let (mut tree, mut rx) = tree_with(&fs, &source, IgnorePatterns::none());
    tree.start()?;

    source.fire(ROOT);
    source.fire(p("deviceB"));

    assert_eq!(rx.try_recv()?, RuntimeEvent::RootChanged);
    assert_eq!(
        rx.try_recv()?,
        RuntimeEvent::DeviceChanged {
            path: p("deviceB")
        }
    );
    // Firing did not touch the child set.
    assert_eq!(tree.child_paths().len(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn new_device_directory_is_picked_up_on_root_change() -> TestResult {
    init_tracing();
    let fs = two_devices();
    let mut h = Harness::new(ROOT, fs.clone());
    h.runtime.start_watching();

    make_device_mock(&fs, Path::new(ROOT), "deviceC", &[]);
    h.source.fire(ROOT);
    assert_eq!(h.pump().await, RuntimeEvent::RootChanged);

    // Reconciliation is done once the root event has been handled.
    assert_eq!(
        h.child_paths(),
        vec![p("deviceA"), p("deviceB"), p("deviceC")]
    );
    assert!(h.source.duplicate_violations().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn added_and_removed_devices_are_reflected_together() -> TestResult {
    let fs = two_devices();
    let mut h = Harness::new(ROOT, fs.clone());
    h.runtime.start_watching();

    fs.remove(p("deviceB"));
    make_device_mock(&fs, Path::new(ROOT), "deviceC", &[]);
    h.source.fire(ROOT);
    h.pump().await;

    assert_eq!(h.child_paths(), vec![p("deviceA"), p("deviceC")]);
    assert_eq!(h.source.live_count(p("deviceB")), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unreadable_root_empties_children_until_readable_again() -> TestResult {
    let fs = two_devices();
    let mut h = Harness::new(ROOT, fs.clone());
    h.runtime.start_watching();

    fs.set_unreadable(ROOT, true);
    h.source.fire(ROOT);
    h.pump().await;

    assert!(h.child_paths().is_empty());
    assert!(h.runtime.tree().root_is_active());
    assert_eq!(h.source.live_paths().len(), 1);

    fs.set_unreadable(ROOT, false);
    h.source.fire(ROOT);
    h.pump().await;

    assert_eq!(h.child_paths(), vec![p("deviceA"), p("deviceB")]);
    Ok(())
}
