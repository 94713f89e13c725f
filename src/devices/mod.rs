// src/devices/mod.rs

//! Device and application enumeration.
//!
//! A device is a directory directly under the devices root. Its installed
//! applications are the `*.app` bundles found one level below
//! `data/Containers/Bundle/Application/` (each bundle sits in its own
//! container directory).

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::fs::FileSystem;
use crate::watch::IgnorePatterns;

/// Location of application containers inside a device directory.
pub const APPLICATIONS_SUBPATH: &str = "data/Containers/Bundle/Application";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    /// Bundle name without the `.app` extension.
    pub name: String,
    pub bundle_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Directory name (the device UDID for CoreSimulator).
    pub id: String,
    pub path: PathBuf,
    pub applications: Vec<Application>,
}

/// Point-in-time view of every device and its applications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub devices: Vec<Device>,
}

/// Supplies the current device/application state to the rebuild.
///
/// Implementations may block on I/O; the view rebuilder calls them from a
/// blocking thread.
pub trait DeviceStateProvider: Send + Sync + Debug {
    fn snapshot(&self) -> Result<DeviceSnapshot>;
}

/// Reads devices straight from the devices root directory.
#[derive(Debug, Clone)]
pub struct DirectoryStateProvider {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    ignore: IgnorePatterns,
}

impl DirectoryStateProvider {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>, ignore: IgnorePatterns) -> Self {
        Self {
            root: root.into(),
            fs,
            ignore,
        }
    }

    fn applications_of(&self, device_path: &Path) -> Result<Vec<Application>> {
        let containers_dir = device_path.join(APPLICATIONS_SUBPATH);
        if !self.fs.is_dir(&containers_dir) {
            return Ok(Vec::new());
        }

        let mut applications = Vec::new();
        for container in self.fs.read_dir(&containers_dir)? {
            if !self.fs.is_dir(&container) {
                continue;
            }
            for bundle in self.fs.read_dir(&container)? {
                if let Some(app) = application_from_bundle(&bundle) {
                    trace!(bundle = ?app.bundle_path, "found application");
                    applications.push(app);
                }
            }
        }
        Ok(applications)
    }
}

fn application_from_bundle(bundle: &Path) -> Option<Application> {
    if bundle.extension()? != "app" {
        return None;
    }
    let name = bundle.file_stem()?.to_string_lossy().into_owned();
    Some(Application {
        name,
        bundle_path: bundle.to_path_buf(),
    })
}

impl DeviceStateProvider for DirectoryStateProvider {
    fn snapshot(&self) -> Result<DeviceSnapshot> {
        let entries = self
            .fs
            .read_dir(&self.root)
            .with_context(|| format!("listing devices under {:?}", self.root))?;

        let mut devices = Vec::new();
        for path in entries {
            if self.ignore.is_ignored(&path) || !self.fs.is_dir(&path) {
                continue;
            }
            let Some(id) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let applications = self
                .applications_of(&path)
                .with_context(|| format!("listing applications of device {id}"))?;
            devices.push(Device {
                id,
                path,
                applications,
            });
        }
        devices.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(devices = devices.len(), "device snapshot taken");
        Ok(DeviceSnapshot { devices })
    }
}
