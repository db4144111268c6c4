// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Solar Admin - inspection pipeline dashboard
//!
//! A desktop dashboard for the solar-panel aerial inspection pipeline:
//! project status, backend job triggers, and the crop and defect review
//! annotation editors.
//!
//! Usage: `solar-admin [config.yaml]`

mod app;
mod config;
mod editor;
mod error;
mod io;
mod models;
mod services;
mod ui;
mod util;

use anyhow::Result;
use app::SolarAdminApp;
use config::AppConfig;
use services::Services;
use std::path::PathBuf;

fn main() -> Result<()> {
    let config_path = AppConfig::config_path(std::env::args_os().nth(1).map(PathBuf::from));
    let loaded = AppConfig::load_optional(&config_path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    // Initialize logging; RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    if found {
        log::info!("Loaded config from {}", config_path.display());
    } else {
        log::warn!("Config file {} not found, using defaults", config_path.display());
    }

    let services = Services::local(config, config_path.parent())?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Solar Admin"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Solar Admin",
        options,
        Box::new(move |_cc| Ok(Box::new(SolarAdminApp::new(services)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
