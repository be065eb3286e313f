//! Application entry point wiring egui/eframe to launch the converter UI.

use std::path::PathBuf;

use eframe::egui;
use egui_phosphor::Variant;

use crate::config::AppConfig;
use crate::ui::Csv2RdfApp;

/// Bootstrap the desktop application and run the main egui event loop.
///
/// `notices` are start-up problems shown in the error dialog of the first frame.
pub fn run(
    config: AppConfig,
    config_path: PathBuf,
    log_dir: PathBuf,
    notices: Vec<String>,
) -> eframe::Result<()> {
    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([560.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CSV to RDF/XML converter",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(Csv2RdfApp::new(
                config,
                config_path,
                log_dir,
                notices,
            )))
        }),
    )
}
