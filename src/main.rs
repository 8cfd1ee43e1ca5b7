// SPDX-License-Identifier: MPL-2.0

//! netspeed-tray entry point
//!
//! Binds the configured adapter, spawns the tray service on its own thread,
//! then runs the blocking sample/render loop: one burst of micro-samples,
//! one smoothed emission, one icon frame, roughly every second. Menu
//! commands are drained between bursts so the tray stays responsive while a
//! burst sleeps.

mod click;
mod config;
mod icon;
mod monitor;
mod theme;
mod tray;

use config::Config;
use icon::{format_mbps, render_icon, tooltip_text};
use log::{error, info, warn};
use monitor::NetworkMonitor;
use monitor::network::list_adapters;
use std::sync::mpsc;
use theme::{DesktopThemeSource, ThemeSource, glyph_color};
use tray::{SpeedTray, TrayCommand};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = Config::load().unwrap_or_else(|err| {
        warn!("could not load config ({err}), using defaults");
        Config::default()
    });

    let adapters = list_adapters();
    if adapters.is_empty() {
        warn!("no network adapters enumerated yet, waiting for one to appear");
    }

    let (command_tx, command_rx) = mpsc::channel();
    let service = ksni::TrayService::new(SpeedTray::new(
        adapters,
        config.device.as_deref(),
        command_tx,
    ));
    let handle = service.handle();
    service.spawn();

    let mut sampler = NetworkMonitor::new();
    sampler.configure(config.device.as_deref());
    info!("monitoring adapter {:?}", sampler.device());

    let theme_source = DesktopThemeSource;

    loop {
        let mut quit = false;
        while let Ok(command) = command_rx.try_recv() {
            match command {
                TrayCommand::SelectAdapter(name) => {
                    info!("switching to adapter {name}");
                    sampler.configure(Some(&name));
                    config.device = Some(name);
                    if let Err(err) = config.save() {
                        warn!("could not persist adapter selection: {err}");
                    }
                }
                TrayCommand::RefreshAdapters => {
                    let adapters = list_adapters();
                    handle.update(move |tray: &mut SpeedTray| {
                        tray.set_adapters(adapters.clone());
                    });
                }
                TrayCommand::Quit => quit = true,
            }
        }
        if quit {
            break;
        }

        // An unresolved binding means startup found no adapters; rescan
        // until one appears.
        if sampler.device().is_none() {
            sampler.configure(config.device.as_deref());
        }

        // Blocks for ~1 s of micro-sampling. No emission means the adapter
        // was unreadable; the previous frame stays on screen.
        let Some(rate) = sampler.sample_burst() else {
            continue;
        };

        let down = format_mbps(rate.rx_bytes_per_sec);
        let up = format_mbps(rate.tx_bytes_per_sec);
        let color = glyph_color(&theme_source.read_theme());

        match render_icon(&down, color) {
            Ok(bitmap) => {
                let tooltip = tooltip_text(&up, &down);
                handle.update(move |tray: &mut SpeedTray| {
                    tray.set_frame(&bitmap, tooltip.clone());
                });
            }
            Err(err) => {
                // Skip this frame only; the next burst retries.
                error!("icon render failed: {err}");
            }
        }
    }

    // Hide the icon before exiting so the shell does not keep a stale entry.
    handle.shutdown();
    info!("exiting");
    Ok(())
}
