// src/logging.rs

//! Logging setup for `simwatch` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection:
//! 1. `--log-level` sets one level for simwatch (other crates stay at `warn`).
//! 2. Otherwise `SIMWATCH_LOG` is read as a full `EnvFilter` directive
//!    string, e.g. `debug` or `simwatch::engine=trace,notify=debug`.
//! 3. Otherwise `simwatch=info,warn`.
//!
//! Output goes to STDERR; stdout carries the rendered menu.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "SIMWATCH_LOG";

const DEFAULT_DIRECTIVES: &str = "simwatch=info,warn";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Compute the filter from the CLI flag and the raw `SIMWATCH_LOG` value.
/// Malformed directives are an error.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(format!("simwatch={},warn", level_name(level))));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value '{directives}'")),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVES)),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
