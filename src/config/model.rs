// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Default delay before a rebuild after a change inside a device directory.
pub const DEFAULT_DEVICE_DELAY_MS: u64 = 1_000;

/// Default delay before a rebuild after the devices root itself changed.
///
/// Longer than the device delay so that the burst of directory activity of
/// a simulator boot or shutdown settles into one rebuild.
pub const DEFAULT_ROOT_DELAY_MS: u64 = 5_000;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// root = "~/Library/Developer/CoreSimulator/Devices"
/// device_delay_ms = 1000
/// root_delay_ms = 5000
/// ignore = [".*"]
///
/// [view]
/// show_empty_devices = false
/// version_label = "1.0"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub view: ViewSection,
}

/// Validated configuration. Obtain one through `ConfigFile::try_from`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub view: ViewSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, view: ViewSection) -> Self {
        Self { watch, view }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(WatchSection::default(), ViewSection::default())
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Devices root. A leading `~/` is expanded from `$HOME`.
    ///
    /// If `None`, the CoreSimulator default location is used.
    #[serde(default)]
    pub root: Option<String>,

    /// Quiet period after a change inside a device directory.
    #[serde(default = "default_device_delay_ms")]
    pub device_delay_ms: u64,

    /// Quiet period after the devices root listing changed.
    #[serde(default = "default_root_delay_ms")]
    pub root_delay_ms: u64,

    /// Glob patterns matched against device directory names. Matching
    /// directories get no child watcher and are not listed as devices.
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_device_delay_ms() -> u64 {
    DEFAULT_DEVICE_DELAY_MS
}

fn default_root_delay_ms() -> u64 {
    DEFAULT_ROOT_DELAY_MS
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: None,
            device_delay_ms: default_device_delay_ms(),
            root_delay_ms: default_root_delay_ms(),
            ignore: Vec::new(),
        }
    }
}

impl WatchSection {
    pub fn device_delay(&self) -> Duration {
        Duration::from_millis(self.device_delay_ms)
    }

    pub fn root_delay(&self) -> Duration {
        Duration::from_millis(self.root_delay_ms)
    }
}

/// `[view]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSection {
    /// Show devices that have no installed applications.
    #[serde(default)]
    pub show_empty_devices: bool,

    /// Optional version string shown at the bottom of the menu.
    #[serde(default)]
    pub version_label: Option<String>,
}
