// src/view/rebuilder.rs

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::devices::DeviceStateProvider;
use crate::engine::RebuildBackend;
use crate::types::WatchStatus;
use crate::view::consumer::ViewConsumer;
use crate::view::menu::{MenuOptions, MenuTree};

/// Production [`RebuildBackend`]: snapshot devices, build the menu, publish.
#[derive(Debug)]
pub struct ViewRebuilder<C: ViewConsumer> {
    provider: Arc<dyn DeviceStateProvider>,
    consumer: C,
    options: MenuOptions,
    last_menu: Option<MenuTree>,
}

impl<C: ViewConsumer> ViewRebuilder<C> {
    pub fn new(provider: Arc<dyn DeviceStateProvider>, consumer: C, options: MenuOptions) -> Self {
        Self {
            provider,
            consumer,
            options,
            last_menu: None,
        }
    }

    /// The menu published by the last successful rebuild.
    pub fn last_menu(&self) -> Option<&MenuTree> {
        self.last_menu.as_ref()
    }

    async fn rebuild_inner(&mut self) -> Result<()> {
        let provider = Arc::clone(&self.provider);
        let snapshot = tokio::task::spawn_blocking(move || provider.snapshot())
            .await
            .context("device snapshot task panicked")??;

        let menu = MenuTree::build(&snapshot, &self.options);
        debug!(devices = menu.device_labels().len(), "publishing menu");
        self.consumer.publish(&menu)?;
        self.last_menu = Some(menu);
        Ok(())
    }
}

impl<C: ViewConsumer> RebuildBackend for ViewRebuilder<C> {
    fn rebuild(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.rebuild_inner())
    }

    fn status_changed(&mut self, status: WatchStatus) {
        self.consumer.status_changed(status);
    }
}
