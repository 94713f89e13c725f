// src/watch/mod.rs

//! Directory watching.
//!
//! This module is responsible for:
//! - A single-directory watcher with idempotent start/stop ([`watcher`]).
//! - The OS registration seam and its `notify` implementation ([`source`]).
//! - Ignore patterns for entries under the devices root ([`patterns`]).
//!
//! It does **not** know about the watcher tree or debouncing; it only turns
//! filesystem changes into callback invocations.

pub mod patterns;
pub mod source;
pub mod watcher;

pub use patterns::IgnorePatterns;
pub use source::{ChangeCallback, NotifyWatchSource, WatchRegistration, WatchSource};
pub use watcher::{DirectoryWatcher, WatcherFactory};
