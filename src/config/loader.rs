// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SimwatchError};

/// Location of the simulator devices directory relative to `$HOME`.
pub const DEFAULT_DEVICES_SUBPATH: &str = "Library/Developer/CoreSimulator/Devices";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config the CLI asked for.
///
/// - An explicit path must exist.
/// - Without one, [`default_config_path`] is used if present.
/// - Otherwise built-in defaults apply.
pub fn load_optional(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        debug!(path = ?default_path, "loading default config file");
        return load_and_validate(default_path);
    }

    debug!("no config file found; using built-in defaults");
    Ok(ConfigFile::default())
}

/// Default config location: `Simwatch.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Simwatch.toml")
}

/// Resolve the devices root the watcher tree is built on.
///
/// Priority: CLI `--root`, then `[watch].root`, then
/// `$HOME/Library/Developer/CoreSimulator/Devices`. The result is fixed for
/// the lifetime of the watcher tree.
pub fn resolve_root(cli_root: Option<&str>, cfg: &ConfigFile) -> Result<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    resolve_root_with_home(cli_root, cfg, home.as_deref())
}

/// Same as [`resolve_root`] with an explicit home directory.
pub fn resolve_root_with_home(
    cli_root: Option<&str>,
    cfg: &ConfigFile,
    home: Option<&Path>,
) -> Result<PathBuf> {
    let configured = cli_root.or(cfg.watch.root.as_deref());

    match configured {
        Some(raw) => expand_home(raw, home),
        None => {
            let home = home.ok_or_else(|| {
                SimwatchError::ConfigError(
                    "no devices root configured and $HOME is not set".to_string(),
                )
            })?;
            Ok(home.join(DEFAULT_DEVICES_SUBPATH))
        }
    }
}

fn expand_home(raw: &str, home: Option<&Path>) -> Result<PathBuf> {
    match raw.strip_prefix("~/") {
        Some(rest) => {
            let home = home.ok_or_else(|| {
                SimwatchError::ConfigError(format!(
                    "cannot expand '{raw}': $HOME is not set"
                ))
            })?;
            Ok(home.join(rest))
        }
        None if raw == "~" => home.map(Path::to_path_buf).ok_or_else(|| {
            SimwatchError::ConfigError("cannot expand '~': $HOME is not set".to_string())
        }),
        None => Ok(PathBuf::from(raw)),
    }
}
