#![allow(dead_code)]

mod app;
mod data;
mod error;
mod geometry;
mod gui;
mod input;
mod log;
mod pipeline;
mod scene;
mod tagging;
mod viewer;

use app::TifViewerApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    ::log::info!("Starting TIF Viewer v{}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("TIF Viewer")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "TIF Viewer",
        options,
        Box::new(|cc| Ok(Box::new(TifViewerApp::new(cc)))),
    )
}
