// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

/// Why a [`DirectoryWatcher`](crate::watch::DirectoryWatcher) could not
/// start observing its path.
///
/// Every call site in the watcher tree treats this as non-fatal: the
/// watcher simply stays stopped until the next reconciliation or restart.
#[derive(Error, Debug)]
pub enum WatchStartError {
    #[error("watch path does not exist: {0:?}")]
    Missing(PathBuf),

    #[error("watch path is not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("failed to register watch on {path:?}: {source}")]
    Register {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl WatchStartError {
    /// The path the failed watcher was configured for.
    pub fn path(&self) -> &PathBuf {
        match self {
            WatchStartError::Missing(path) | WatchStartError::NotADirectory(path) => path,
            WatchStartError::Register { path, .. } => path,
        }
    }
}

#[derive(Error, Debug)]
pub enum SimwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to list directory {path:?}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("view rebuild failed: {0}")]
    Rebuild(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SimwatchError>;
