// src/view/menu.rs

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use crate::config::ViewSection;
use crate::devices::{Application, DeviceSnapshot};

/// Commands the menu offers besides the device entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Refresh,
    Quit,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Refresh => "Refresh",
            MenuAction::Quit => "Quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Separator,
    /// Non-selectable label.
    Header(String),
    Device {
        label: String,
        applications: Vec<MenuItem>,
    },
    Application {
        label: String,
        bundle_path: PathBuf,
    },
    Action(MenuAction),
}

/// Options controlling how a snapshot becomes a menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuOptions {
    pub show_empty_devices: bool,
    pub version_label: Option<String>,
}

impl From<&ViewSection> for MenuOptions {
    fn from(section: &ViewSection) -> Self {
        Self {
            show_empty_devices: section.show_empty_devices,
            version_label: section.version_label.clone(),
        }
    }
}

/// The derived view: devices with their applications, then the actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuTree {
    pub items: Vec<MenuItem>,
}

impl MenuTree {
    pub fn build(snapshot: &DeviceSnapshot, options: &MenuOptions) -> Self {
        let mut items = Vec::new();

        let devices = snapshot
            .devices
            .iter()
            .filter(|d| options.show_empty_devices || !d.applications.is_empty());

        for device in devices {
            let mut applications: Vec<&Application> = device.applications.iter().collect();
            applications.sort_by_key(|app| app.name.to_lowercase());

            items.push(MenuItem::Device {
                label: device.id.clone(),
                applications: applications
                    .into_iter()
                    .map(|app| MenuItem::Application {
                        label: app.name.clone(),
                        bundle_path: app.bundle_path.clone(),
                    })
                    .collect(),
            });
        }

        items.push(MenuItem::Separator);
        items.push(MenuItem::Action(MenuAction::Refresh));
        items.push(MenuItem::Action(MenuAction::Quit));

        if let Some(version) = &options.version_label {
            items.push(MenuItem::Separator);
            items.push(MenuItem::Header(format!("Version {version}")));
        }

        Self { items }
    }

    /// Labels of the device entries, in menu order.
    pub fn device_labels(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                MenuItem::Device { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Render as indented plain text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            // Writing into a String cannot fail.
            let _ = render_item(&mut out, item, 0);
        }
        out
    }
}

fn render_item(out: &mut String, item: &MenuItem, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match item {
        MenuItem::Separator => writeln!(out, "{indent}----"),
        MenuItem::Header(label) => writeln!(out, "{indent}[{label}]"),
        MenuItem::Device {
            label,
            applications,
        } => {
            writeln!(out, "{indent}{label} ({} apps)", applications.len())?;
            for app in applications {
                render_item(out, app, depth + 1)?;
            }
            Ok(())
        }
        MenuItem::Application { label, .. } => writeln!(out, "{indent}- {label}"),
        MenuItem::Action(action) => writeln!(out, "{indent}> {}", action.label()),
    }
}
