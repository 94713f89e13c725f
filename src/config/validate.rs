// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SimwatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SimwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.view))
    }
}

/// Run every semantic check on a raw config.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_root(cfg)?;
    validate_delays(cfg)?;
    validate_ignore_patterns(cfg)?;
    Ok(())
}

fn validate_root(cfg: &RawConfigFile) -> Result<()> {
    if let Some(root) = cfg.watch.root.as_deref() {
        if root.trim().is_empty() {
            return Err(SimwatchError::ConfigError(
                "[watch].root must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_delays(cfg: &RawConfigFile) -> Result<()> {
    let watch = &cfg.watch;

    if watch.device_delay_ms == 0 {
        return Err(SimwatchError::ConfigError(
            "[watch].device_delay_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if watch.root_delay_ms == 0 {
        return Err(SimwatchError::ConfigError(
            "[watch].root_delay_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if watch.device_delay_ms > watch.root_delay_ms {
        return Err(SimwatchError::ConfigError(format!(
            "[watch].device_delay_ms ({}) must not exceed root_delay_ms ({})",
            watch.device_delay_ms, watch.root_delay_ms
        )));
    }

    Ok(())
}

fn validate_ignore_patterns(cfg: &RawConfigFile) -> Result<()> {
    for pattern in cfg.watch.ignore.iter() {
        Glob::new(pattern).map_err(|e| {
            SimwatchError::ConfigError(format!(
                "invalid [watch].ignore pattern '{}': {}",
                pattern, e
            ))
        })?;
    }
    Ok(())
}
