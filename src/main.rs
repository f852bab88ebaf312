mod analysis;
mod app;
mod capability;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use app::RustyDescribeApp;
use config::AppConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::load();
    let backend = capability::detect(&config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([600.0, 400.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Describe – Descriptive Data Analysis",
        options,
        Box::new(move |_cc| Ok(Box::new(RustyDescribeApp::new(AppState::new(config, backend))))),
    )
}
