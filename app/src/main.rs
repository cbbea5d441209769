mod app;
mod classifier;
mod config;
mod loader;
mod logging;
mod particles;
mod ui;

use anyhow::anyhow;
use app::{SpamDetectorApp, WINDOW_TITLE};
use eframe::egui;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
    let loaded = config::load();
    logging::init_tracing(loaded.config.log_level())?;

    for warning in &loaded.warnings {
        warn!("config: {}", warning);
    }
    match &loaded.source {
        Some(path) => info!(path = %path.display(), "using configuration file"),
        None => info!("no configuration file found, using defaults"),
    }

    let config = loaded.config;
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_maximized(true)
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |cc| Ok(Box::new(SpamDetectorApp::new(cc, &config)))),
    )
    .map_err(|e| anyhow!("failed to start the window: {e}"))
}
