mod app;

use std::path::PathBuf;

use app::SignalStackApp;
use eframe::egui;

/// `signalstack [--config <file.json>] [recording.csv]`
fn parse_args() -> (Option<PathBuf>, Option<PathBuf>) {
    let mut config = None;
    let mut file = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config = args.next().map(PathBuf::from),
            _ => file = Some(PathBuf::from(arg)),
        }
    }
    (config, file)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let (config_path, initial_file) = parse_args();
    let session = match app::build_session(config_path.as_deref()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };
    tracing::info!("Starting with {:?} backend", session.backend().kind());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("SignalStack")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "SignalStack",
        options,
        Box::new(|cc| Ok(Box::new(SignalStackApp::new(cc, session, initial_file)))),
    )
}
