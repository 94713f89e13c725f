// src/config/mod.rs

//! Configuration loading and validation for simwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and resolve the devices root (`loader.rs`).
//! - Validate delays and ignore patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    load_and_validate, load_from_path, load_optional, resolve_root, resolve_root_with_home,
};
pub use model::{ConfigFile, RawConfigFile, ViewSection, WatchSection};
pub use validate::validate_raw_config;
