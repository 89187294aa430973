// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! clipsmith - fetch a video, trim it and burn in captions.
//!
//! A desktop client for a remote video editing service. Videos are looked
//! up and downloaded through the server, previewed locally in mpv, and
//! trimmed or captioned by uploading them back to the server.

mod app;
mod config;
mod error;
mod gateway;
mod io;
mod models;
mod session;
mod ui;
mod util;
mod worker;

use anyhow::Result;
use app::ClipsmithApp;
use config::AppConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring unreadable config: {:#}", e);
            AppConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 760.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("clipsmith"),
        ..Default::default()
    };

    eframe::run_native(
        "clipsmith",
        options,
        Box::new(|cc| Ok(Box::new(ClipsmithApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
