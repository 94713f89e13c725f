// src/view/consumer.rs

use std::io::Write;

use anyhow::{Context, Result};

use crate::types::WatchStatus;
use crate::view::menu::MenuTree;

/// Receives every settled rebuild.
pub trait ViewConsumer: Send {
    fn publish(&mut self, menu: &MenuTree) -> Result<()>;

    fn status_changed(&mut self, _status: WatchStatus) {}
}

/// Prints the menu to stdout.
#[derive(Debug, Default)]
pub struct StdoutConsumer;

impl StdoutConsumer {
    pub fn new() -> Self {
        Self
    }
}

impl ViewConsumer for StdoutConsumer {
    fn publish(&mut self, menu: &MenuTree) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(menu.render().as_bytes())
            .and_then(|_| stdout.flush())
            .context("writing menu to stdout")
    }

    fn status_changed(&mut self, status: WatchStatus) {
        if status.is_degraded() {
            println!("[simwatch] ! not watching: {status}");
        }
    }
}
