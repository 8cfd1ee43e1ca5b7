// SPDX-License-Identifier: MPL-2.0

//! Tray host integration
//!
//! A StatusNotifierItem carrying the rendered icon pixmap and tooltip. The
//! sampling loop pushes new frames in as owned values through the ksni
//! handle; menu interactions are sent back over a channel and drained by the
//! loop between bursts, so the two sides never share mutable state.

use crate::click::{ClickOutcome, DoubleClickDetector};
use crate::icon::IconBitmap;
use log::debug;
use std::sync::mpsc::Sender;
use std::time::Instant;

/// Requests the tray menu sends back to the sampling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayCommand {
    /// Monitor a different adapter (and persist the choice).
    SelectAdapter(String),
    /// Re-enumerate adapters and rebuild the menu.
    RefreshAdapters,
    Quit,
}

pub struct SpeedTray {
    icon: ksni::Icon,
    tooltip: String,
    adapters: Vec<String>,
    selected: usize,
    clicks: DoubleClickDetector,
    commands: Sender<TrayCommand>,
}

impl SpeedTray {
    pub fn new(adapters: Vec<String>, selected: Option<&str>, commands: Sender<TrayCommand>) -> Self {
        let selected = selected
            .and_then(|name| adapters.iter().position(|a| a == name))
            .unwrap_or(0);
        Self {
            icon: to_ksni_icon(&IconBitmap::blank()),
            tooltip: String::new(),
            adapters,
            selected,
            clicks: DoubleClickDetector::default(),
            commands,
        }
    }

    /// Swap in the next rendered frame.
    pub fn set_frame(&mut self, bitmap: &IconBitmap, tooltip: String) {
        self.icon = to_ksni_icon(bitmap);
        self.tooltip = tooltip;
    }

    /// Replace the adapter list, keeping the selection by name where possible.
    pub fn set_adapters(&mut self, adapters: Vec<String>) {
        let current = self.adapters.get(self.selected).cloned();
        self.selected = current
            .and_then(|name| adapters.iter().position(|a| *a == name))
            .unwrap_or(0);
        self.adapters = adapters;
    }

    #[cfg(test)]
    fn selected_adapter(&self) -> Option<&str> {
        self.adapters.get(self.selected).map(String::as_str)
    }
}

fn to_ksni_icon(bitmap: &IconBitmap) -> ksni::Icon {
    ksni::Icon {
        width: bitmap.width,
        height: bitmap.height,
        data: bitmap.argb.clone(),
    }
}

impl ksni::Tray for SpeedTray {
    fn id(&self) -> String {
        "netspeed-tray".into()
    }

    fn title(&self) -> String {
        "NetSpeedTray".into()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![self.icon.clone()]
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: self.tooltip.clone(),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::*;

        vec![
            MenuItem::RadioGroup(RadioGroup {
                selected: self.selected,
                select: Box::new(|tray: &mut Self, index| {
                    tray.selected = index;
                    if let Some(name) = tray.adapters.get(index) {
                        let _ = tray.commands.send(TrayCommand::SelectAdapter(name.clone()));
                    }
                }),
                options: self
                    .adapters
                    .iter()
                    .map(|name| RadioItem {
                        label: name.clone(),
                        ..Default::default()
                    })
                    .collect(),
            }),
            StandardItem {
                label: "Quit".into(),
                activate: Box::new(|tray: &mut Self| {
                    let _ = tray.commands.send(TrayCommand::Quit);
                }),
                ..Default::default()
            }
            .into(),
        ]
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        // A double-click refreshes the adapter list, the closest analog of
        // opening a settings dialog.
        if self.clicks.click(Instant::now()) == ClickOutcome::Double {
            debug!("double-click: refreshing adapter list");
            let _ = self.commands.send(TrayCommand::RefreshAdapters);
        }
    }
}
