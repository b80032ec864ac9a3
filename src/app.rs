use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use eframe::egui;

use signalstack::config::ViewerConfig;
use signalstack::data::buffer::InMemoryRecording;
use signalstack::data::loader;
use signalstack::error::Result;
use signalstack::render::orchestrator::RedrawOutcome;
use signalstack::render::plot_interaction::PlotViewState;
use signalstack::render::resampler::RenderingBackend;
use signalstack::state::session::{TimeSeriesSession, UiEvent};
use signalstack::state::theme::Theme;
use signalstack::ui::{channel_panel, chart_panel};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pending async file load result.
struct PendingLoad {
    path: PathBuf,
    result: Arc<Mutex<Option<Result<InMemoryRecording>>>>,
}

/// The viewer window: channel picker on the left, stacked chart in the
/// middle, amplitude slider in the footer.
pub struct SignalStackApp {
    session: TimeSeriesSession,
    view: PlotViewState,
    theme: Theme,
    /// Slider value; only sent to the session when it changes.
    amplitude: f64,
    /// Name of the loaded file, shown in the header.
    source_name: Option<String>,
    /// An error message to display until dismissed.
    error_message: Option<String>,
    pending_load: Option<PendingLoad>,
}

impl SignalStackApp {
    pub fn new(cc: &eframe::CreationContext<'_>, session: TimeSeriesSession, initial_file: Option<PathBuf>) -> Self {
        let theme = Theme::default();
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();
        style.text_styles.insert(egui::TextStyle::Body, egui::FontId::proportional(14.5));
        style.text_styles.insert(egui::TextStyle::Button, egui::FontId::proportional(14.0));
        style.text_styles.insert(egui::TextStyle::Heading, egui::FontId::proportional(20.0));
        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.visuals.window_corner_radius = egui::CornerRadius::same(8);
        ctx.set_style(style);
        ctx.set_visuals(theme.visuals());

        let amplitude = session.scaling().amplitude();
        let mut app = Self {
            session,
            view: PlotViewState::new(),
            theme,
            amplitude,
            source_name: None,
            error_message: None,
            pending_load: None,
        };
        if let Some(path) = initial_file {
            app.load_file(&path);
        }
        app
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Recordings", &["csv", "txt"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.load_file(&path);
        }
    }

    /// Parse a recording on a helper thread so the UI stays responsive.
    fn load_file(&mut self, path: &Path) {
        let path_buf = path.to_path_buf();
        let rate = self.session.config().default_sample_rate;
        let result: Arc<Mutex<Option<Result<InMemoryRecording>>>> = Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);

        std::thread::spawn(move || {
            let loaded = loader::load_file(&path_buf, rate);
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(loaded);
            }
        });

        self.pending_load = Some(PendingLoad {
            path: path.to_path_buf(),
            result,
        });
    }

    fn poll_pending_load(&mut self) {
        let Some(pending) = &self.pending_load else {
            return;
        };
        let path = pending.path.clone();
        let finished = pending.result.lock().map(|mut slot| slot.take()).ok();
        let result = match finished {
            Some(Some(result)) => result,
            Some(None) => return,
            None => {
                self.error_message = Some("File loader thread panicked".to_string());
                self.pending_load = None;
                return;
            }
        };
        self.pending_load = None;

        match result.and_then(|recording| self.session.load_dataset(&recording)) {
            Ok(_) => {
                self.source_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                self.amplitude = self.session.scaling().amplitude();
                self.view.auto_fit = true;
                self.error_message = None;
            }
            Err(e) => {
                tracing::error!("Failed to load {:?}: {e}", path);
                self.error_message = Some(format!("Failed to load file: {e}"));
            }
        }
    }

    fn export_figure(&mut self) {
        let json = match self.session.figure_json() {
            Ok(json) => json,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return;
            }
        };
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("figure.json")
            .save_file()
        {
            match std::fs::write(&path, json) {
                Ok(()) => tracing::info!("Exported figure to {:?}", path),
                Err(e) => self.error_message = Some(format!("Failed to write file: {e}")),
            }
        }
    }

    fn dispatch(&mut self, events: Vec<UiEvent>) {
        for event in events {
            match self.session.handle_event(event) {
                Ok(RedrawOutcome::FullRedraw) | Ok(RedrawOutcome::Cleared) => {
                    self.view.auto_fit = true;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Event rejected: {e}");
                    self.error_message = Some(e.to_string());
                }
            }
        }
        // A rejected amplitude snaps the slider back.
        self.amplitude = self.session.scaling().amplitude();
    }
}

impl eframe::App for SignalStackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(self.theme.visuals());

        let mut dropped_paths: Vec<PathBuf> = Vec::new();
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    dropped_paths.push(path.clone());
                }
            }
        });
        if let Some(path) = dropped_paths.first() {
            self.load_file(path);
        }

        let mut events: Vec<UiEvent> = Vec::new();
        let mut open_file = false;
        let mut export = false;

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 8)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("SignalStack");
                    ui.separator();
                    if ui.button("Open CSV").clicked() {
                        open_file = true;
                    }
                    let has_figure = !self.session.rendered_figure().is_empty();
                    if ui.add_enabled(has_figure, egui::Button::new("Export Figure")).clicked() {
                        export = true;
                    }
                    if let Some(name) = &self.source_name {
                        ui.separator();
                        ui.label(egui::RichText::new(name).weak());
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(format!("{} Mode", self.theme.toggle().label())).clicked() {
                            self.theme = self.theme.toggle();
                        }
                        ui.separator();
                        ui.small(format!("v{VERSION}"));
                    });
                });
            });

        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 6)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (min, max) = self.session.scaling().bounds();
                    let step = self.session.scaling().slider_step();
                    let mut slider = egui::Slider::new(&mut self.amplitude, min..=max).text("Amplitude");
                    if let Some(step) = step {
                        slider = slider.step_by(step);
                    }
                    let enabled = self.session.buffer().is_some();
                    if ui.add_enabled(enabled, slider).changed() {
                        events.push(UiEvent::AmplitudeChanged(self.amplitude));
                    }

                    if let Some(buffer) = self.session.buffer() {
                        ui.separator();
                        ui.label(
                            egui::RichText::new(format!(
                                "{} channels, {:.1} s @ {} Hz",
                                buffer.row_count(),
                                buffer.end_time() - buffer.start_time(),
                                buffer.sample_rate()
                            ))
                            .weak(),
                        );
                    }

                    match self.session.backend() {
                        RenderingBackend::Resampled(r) => {
                            ui.separator();
                            ui.label(
                                egui::RichText::new(format!("{} <= {} pts", r.reduction().label(), r.max_points()))
                                    .weak(),
                            );
                        }
                        RenderingBackend::Direct(_) => {
                            ui.separator();
                            ui.label(egui::RichText::new("full resolution").weak());
                        }
                    }

                    if let Some(msg) = &self.error_message {
                        ui.separator();
                        ui.colored_label(egui::Color32::from_rgb(255, 80, 80), msg);
                        if ui.small_button("dismiss").clicked() {
                            self.error_message = None;
                        }
                    }
                });
            });

        egui::SidePanel::left("channels")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                events.extend(channel_panel::show_channel_panel(ui, &self.session));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(event) = chart_panel::show_chart_panel(&self.session, &mut self.view, ui, &self.theme) {
                events.push(event);
            }
        });

        if !events.is_empty() {
            self.dispatch(events);
        }
        if open_file {
            self.open_file_dialog();
        }
        if export {
            self.export_figure();
        }

        self.poll_pending_load();
        if let Some(pending) = &self.pending_load {
            let name = pending
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            egui::Window::new("Loading")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Loading {name}..."));
                    });
                });
            ctx.request_repaint();
        }
    }
}

/// Build the session from an optional config file.
pub fn build_session(config_path: Option<&Path>) -> Result<TimeSeriesSession> {
    let config = match config_path {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    TimeSeriesSession::new(config)
}
