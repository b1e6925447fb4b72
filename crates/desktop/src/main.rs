//! Parley Desktop: application entry.

mod app;
mod blocks;

use eframe::egui;

fn main() -> anyhow::Result<()> {
    app::install_logger();
    let backend = app::Backend::start(None)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Parley",
        options,
        Box::new(|cc| Box::new(app::ParleyApp::new(cc, backend))),
    )
    .map_err(|e| anyhow::anyhow!("desktop window failed: {}", e))
}
