// src/lib.rs

pub mod cli;
pub mod config;
pub mod devices;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod view;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_optional, resolve_root, ConfigFile};
use crate::devices::DirectoryStateProvider;
use crate::engine::{
    DebounceScheduler, RebuildBackend, ReloadDelays, Runtime, RuntimeEvent, WatcherTree,
};
use crate::fs::{FileSystem, RealFileSystem};
use crate::view::{MenuOptions, StdoutConsumer, ViewRebuilder};
use crate::watch::{IgnorePatterns, NotifyWatchSource, WatcherFactory};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and root resolution
/// - device provider + menu rebuilder
/// - watcher tree / debounce scheduler / runtime
/// - Ctrl-C and SIGHUP handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_optional(args.config.as_deref().map(Path::new))?;
    let root = resolve_root(args.root.as_deref(), &cfg)?;
    let ignore = IgnorePatterns::from_patterns(&cfg.watch.ignore)?;

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    // Canonicalize once so child paths compare stably.
    let root = fs.canonicalize(&root).unwrap_or(root);

    let provider = Arc::new(DirectoryStateProvider::new(
        root.clone(),
        Arc::clone(&fs),
        ignore.clone(),
    ));
    let mut rebuilder = ViewRebuilder::new(provider, StdoutConsumer::new(), MenuOptions::from(&cfg.view));

    if args.once {
        rebuilder.rebuild().await?;
        return Ok(());
    }

    // Runtime event channel. Unbounded because notify callbacks are
    // synchronous and must never block.
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let factory = WatcherFactory::new(fs, Arc::new(NotifyWatchSource::new()));
    let tree = WatcherTree::new(root, factory, ignore, rt_tx.clone());
    let scheduler = DebounceScheduler::new(rt_tx.clone());

    spawn_signal_handlers(rt_tx);

    let runtime = Runtime::new(tree, scheduler, rebuilder, ReloadDelays::from(&cfg.watch));
    runtime.run(rt_rx).await?;
    Ok(())
}

/// Ctrl-C → graceful shutdown; SIGHUP → refresh.
fn spawn_signal_handlers(tx: mpsc::UnboundedSender<RuntimeEvent>) {
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C; shutdown via signal disabled");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });
    }

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGHUP; refresh disabled");
                return;
            }
        };
        while hangups.recv().await.is_some() {
            info!("SIGHUP received; refreshing");
            if tx.send(RuntimeEvent::RefreshRequested).is_err() {
                break;
            }
        }
    });

    #[cfg(not(unix))]
    drop(tx);
}

/// Simple dry-run output: print the effective settings.
fn print_dry_run(cfg: &ConfigFile, root: &Path) {
    println!("simwatch dry-run");
    println!("  root = {}", root.display());
    println!("  watch.device_delay_ms = {}", cfg.watch.device_delay_ms);
    println!("  watch.root_delay_ms = {}", cfg.watch.root_delay_ms);
    if !cfg.watch.ignore.is_empty() {
        println!("  watch.ignore = {:?}", cfg.watch.ignore);
    }
    println!("  view.show_empty_devices = {}", cfg.view.show_empty_devices);
    if let Some(ref version) = cfg.view.version_label {
        println!("  view.version_label = {version}");
    }

    debug!("dry-run complete (no watching)");
}
