// src/view/mod.rs

//! The derived view: a menu of devices and their applications.
//!
//! - [`menu`] turns a `DeviceSnapshot` into a `MenuTree`.
//! - [`consumer`] is where finished menus go (stdout in production).
//! - [`rebuilder`] plugs both into the runtime as its `RebuildBackend`.

pub mod consumer;
pub mod menu;
pub mod rebuilder;

pub use consumer::{StdoutConsumer, ViewConsumer};
pub use menu::{MenuAction, MenuItem, MenuOptions, MenuTree};
pub use rebuilder::ViewRebuilder;
