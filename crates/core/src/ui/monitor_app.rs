//! Main monitor application.
//!
//! This module contains the `MonitorApp` struct which implements the
//! `eframe::App` trait. One window switches between the full-screen
//! selection overlay and the status panel.

use super::overlay::SelectionOverlay;
use super::state::{SnapshotEvent, StartMode, UiMode};
use crate::capture::{ScreenCapturer, ScreenSource};
use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::image_processing::ImageProcessor;
use crate::monitor::{MonitorController, MonitorEvent, MonitorState};
use crate::SystemController;
use crate::ocr::TesseractCli;
use crate::region::Rectangle;
use crate::settings::Settings;
use eframe::egui;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Duration;

/// Size of the status panel window.
const PANEL_SIZE: [f32; 2] = [460.0, 560.0];

/// Time for the hidden window to disappear before the screen is captured.
const SNAPSHOT_DELAY: Duration = Duration::from_millis(300);

/// The monitor application: selection overlay plus status panel.
pub struct MonitorApp {
    controller: SystemController,
    capturer: Arc<ScreenCapturer>,
    clipboard: Arc<SystemClipboard>,
    config: Config,
    /// Panel values as last applied; edits are measured against these.
    baseline: Settings,
    settings: Settings,
    mode: UiMode,

    snapshot_tx: Sender<SnapshotEvent>,
    snapshot_rx: Receiver<SnapshotEvent>,

    preview_texture: Option<egui::TextureHandle>,
    notice: Option<String>,
    show_settings: bool,
}

impl MonitorApp {
    /// Creates the application.
    ///
    /// # Arguments
    /// * `cc` - eframe creation context, used to wake the UI from the poller
    /// * `config` - Resolved configuration
    /// * `capturer` - Screen capturer for snapshots and monitoring
    /// * `start` - Whether to open the overlay or use a known region
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        capturer: ScreenCapturer,
        start: StartMode,
    ) -> Self {
        let capturer = Arc::new(capturer);
        let clipboard = Arc::new(SystemClipboard::new());
        let repaint_ctx = cc.egui_ctx.clone();

        let mut controller = MonitorController::new(
            capturer.clone(),
            Arc::new(TesseractCli::new(&config.ocr)),
            clipboard.clone(),
            &config,
        )
        .with_waker(Arc::new(move || repaint_ctx.request_repaint()));

        let mut notice = None;
        let mode = match start {
            StartMode::Select(snapshot) => match controller.begin_selection() {
                Ok(()) => UiMode::Selecting(Box::new(SelectionOverlay::new(&snapshot))),
                Err(e) => {
                    notice = Some(e.to_string());
                    UiMode::Panel
                }
            },
            StartMode::Region(rect) => {
                if let Err(e) = controller.select_region(rect) {
                    notice = Some(e.to_string());
                }
                UiMode::Panel
            }
        };

        let (snapshot_tx, snapshot_rx) = channel();
        let settings = config.to_settings();

        Self {
            controller,
            capturer,
            clipboard,
            config,
            baseline: settings.clone(),
            settings,
            mode,
            snapshot_tx,
            snapshot_rx,
            preview_texture: None,
            notice,
            show_settings: false,
        }
    }

    /// Hides the window and captures a fresh snapshot in the background.
    fn begin_reselect(&mut self, ctx: &egui::Context) {
        if let Err(e) = self.controller.begin_selection() {
            self.notice = Some(e.to_string());
            return;
        }

        self.mode = UiMode::AwaitingSnapshot;
        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));

        let tx = self.snapshot_tx.clone();
        let capturer = self.capturer.clone();
        let ctx = ctx.clone();

        thread::spawn(move || {
            thread::sleep(SNAPSHOT_DELAY);
            let event = match capturer.capture(None) {
                Ok(image) => SnapshotEvent::Ready(image),
                Err(e) => SnapshotEvent::Failed(e.to_string()),
            };
            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    /// Processes the snapshot taken for a reselection.
    fn process_snapshot_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.snapshot_rx.try_recv() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
            match event {
                SnapshotEvent::Ready(image) => {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(false));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(true));
                    self.mode = UiMode::Selecting(Box::new(SelectionOverlay::new(&image)));
                }
                SnapshotEvent::Failed(message) => {
                    tracing::warn!("Snapshot for selection failed: {}", message);
                    let _ = self.controller.commit_selection(None);
                    self.notice = Some(message);
                    self.mode = UiMode::Panel;
                }
            }
        }
    }

    /// Commits the overlay result and returns to the panel.
    fn finish_selection(&mut self, ctx: &egui::Context, selection: Option<Rectangle>) {
        self.notice = match self.controller.commit_selection(selection) {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };

        ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
        ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(true));
        ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(PANEL_SIZE.into()));
        self.mode = UiMode::Panel;
    }

    /// Applies edited settings, persists the edits and starts the poller.
    fn start_monitoring(&mut self) {
        let loaded = Settings::load();
        let (config, stored) =
            apply_panel_edits(&self.config, &self.baseline, &self.settings, loaded.clone());

        if config.ocr != self.config.ocr {
            if let Err(e) = self
                .controller
                .set_recognizer(Arc::new(TesseractCli::new(&config.ocr)))
            {
                self.notice = Some(e.to_string());
                return;
            }
        }
        self.controller.set_timings(config.timings);
        self.config = config;

        if stored != loaded {
            if let Err(e) = stored.save() {
                tracing::warn!("Failed to save settings: {}", e);
            }
        }
        self.baseline = self.settings.clone();

        self.notice = self.controller.start().err().map(|e| e.to_string());
    }

    /// Uploads the latest capture thumbnail.
    fn refresh_preview(&mut self, ctx: &egui::Context) {
        let Some(image) = self.controller.preview() else {
            return;
        };
        let color_image = ImageProcessor::to_color_image(image);

        match &mut self.preview_texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.preview_texture =
                    Some(ctx.load_texture("preview", color_image, egui::TextureOptions::LINEAR));
            }
        }
    }

    /// Renders the status panel.
    fn render_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("codeclip");
            ui.add_space(4.0);

            ui.label(egui::RichText::new(self.controller.status().to_string()).size(16.0));
            if let Some(notice) = &self.notice {
                ui.label(egui::RichText::new(notice).color(egui::Color32::RED));
            }

            ui.separator();
            self.render_code_row(ui);

            match self.controller.region() {
                Some(rect) => ui.label(format!("Region: {}", rect)),
                None => ui.label("Region: none"),
            };
            if self.controller.state() == MonitorState::Monitoring {
                ui.label(format!("Cycles: {}", self.controller.cycles()));
            }

            ui.add_space(6.0);
            self.render_controls(ui, ctx);

            ui.separator();
            if let Some(texture) = &self.preview_texture {
                ui.image((texture.id(), texture.size_vec2()));
            } else {
                ui.label(egui::RichText::new("No capture yet").weak());
            }

            if self.show_settings {
                ui.separator();
                self.render_settings_ui(ui);
            }
        });
    }

    fn render_code_row(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Last code:");
            match self.controller.last_code() {
                Some(code) => {
                    ui.label(egui::RichText::new(code.as_str()).monospace().size(22.0).strong());
                    if ui.button("Copy").clicked() {
                        if let Err(e) = self.clipboard.set_text(code.as_str()) {
                            self.notice = Some(e.to_string());
                        }
                    }
                }
                None => {
                    ui.label(egui::RichText::new("none").weak());
                }
            }
        });
    }

    fn render_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.controller.can_select(), egui::Button::new("Select region"))
                .clicked()
            {
                self.begin_reselect(ctx);
            }
            if ui
                .add_enabled(self.controller.can_start(), egui::Button::new("▶ Start"))
                .clicked()
            {
                self.start_monitoring();
            }
            if ui
                .add_enabled(self.controller.can_stop(), egui::Button::new("■ Stop"))
                .clicked()
            {
                self.notice = self.controller.stop().err().map(|e| e.to_string());
            }
            if ui.button("⚙").clicked() {
                self.show_settings = !self.show_settings;
            }
            if self.controller.is_stopping() {
                ui.spinner();
                ui.label("Stopping after the current pause...");
            }
        });
    }

    /// Renders the settings section.
    fn render_settings_ui(&mut self, ui: &mut egui::Ui) {
        ui.label("Settings");
        let editable = self.controller.state() != MonitorState::Monitoring;

        ui.add_enabled_ui(editable, |ui| {
            egui::Grid::new("settings_grid").num_columns(2).show(ui, |ui| {
                ui.label("Language:");
                ui.add(egui::TextEdit::singleline(&mut self.settings.language).desired_width(120.0));
                ui.end_row();

                ui.label("Page segmentation:");
                ui.add(egui::DragValue::new(&mut self.settings.page_seg_mode).range(0..=13));
                ui.end_row();

                ui.label("Pause after code:");
                ui.add(pause_editor(&mut self.settings.found_pause_ms));
                ui.end_row();

                ui.label("Pause without code:");
                ui.add(pause_editor(&mut self.settings.idle_pause_ms));
                ui.end_row();

                ui.label("Pause after error:");
                ui.add(pause_editor(&mut self.settings.failure_pause_ms));
                ui.end_row();
            });
        });
        if !editable {
            ui.label(egui::RichText::new("Stop monitoring to change settings").weak());
        }
    }
}

/// Folds the panel's edits into the running configuration and into the
/// stored settings.
///
/// Returns the new effective configuration and the settings to persist.
/// Fields the user did not touch keep their environment or command-line
/// overrides in the configuration and their stored value on disk.
fn apply_panel_edits(
    config: &Config,
    baseline: &Settings,
    edited: &Settings,
    stored: Settings,
) -> (Config, Settings) {
    let effective = config.to_settings().with_edits(baseline, edited);

    let mut next = Config::from_settings(&effective);
    next.monitor_index = config.monitor_index;
    next.preview_max = config.preview_max;

    (next, stored.with_edits(baseline, edited))
}

fn pause_editor(value: &mut u64) -> egui::DragValue<'_> {
    egui::DragValue::new(value)
        .range(50..=60_000)
        .speed(50)
        .suffix(" ms")
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Enforce dark mode
        ctx.set_visuals(egui::Visuals::dark());

        self.process_snapshot_events(ctx);

        let events = self.controller.poll_events();
        if events.iter().any(|e| matches!(e, MonitorEvent::Preview(_))) {
            self.refresh_preview(ctx);
        }

        let finished = match &mut self.mode {
            UiMode::Selecting(overlay) => overlay.show(ctx),
            UiMode::AwaitingSnapshot | UiMode::Panel => None,
        };
        if let Some(selection) = finished {
            self.finish_selection(ctx, selection);
        }

        match self.mode {
            UiMode::Panel => {
                if ctx.input(|i| i.viewport().close_requested()) {
                    self.controller.shutdown();
                    return;
                }
                self.render_panel(ctx);
            }
            UiMode::AwaitingSnapshot => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.centered_and_justified(|ui| ui.spinner());
                });
            }
            UiMode::Selecting(_) => {}
        }
    }
}

/// Launches the monitor window and returns when the user closes it.
///
/// # Arguments
/// * `config` - Application configuration
/// * `capturer` - Screen capturer bound to the configured monitor
/// * `start` - Snapshot for an initial selection, or a known region
pub fn run(config: Config, capturer: ScreenCapturer, start: StartMode) -> Result<()> {
    let viewport = egui::ViewportBuilder::default()
        .with_title("codeclip")
        .with_always_on_top();

    let viewport = match start {
        StartMode::Select(_) => viewport.with_fullscreen(true).with_decorations(false),
        StartMode::Region(_) => viewport.with_inner_size(PANEL_SIZE),
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "codeclip",
        options,
        Box::new(move |cc| {
            Ok(Box::new(MonitorApp::new(cc, config, capturer, start)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn command_line_overrides_are_used_but_not_saved() {
        let stored = Settings::default();
        // started with --found-pause-ms 9000 --monitor 1
        let mut config = Config::from_settings(&stored);
        config.timings.found = Duration::from_millis(9_000);
        config.monitor_index = 1;

        let baseline = config.to_settings();
        let mut edited = baseline.clone();
        edited.idle_pause_ms = 400;

        let (next, saved) = apply_panel_edits(&config, &baseline, &edited, stored.clone());

        assert_eq!(next.timings.found, Duration::from_millis(9_000));
        assert_eq!(next.timings.idle, Duration::from_millis(400));
        assert_eq!(next.monitor_index, 1);

        assert_eq!(saved.found_pause_ms, stored.found_pause_ms);
        assert_eq!(saved.idle_pause_ms, 400);
    }

    #[test]
    fn starting_without_edits_saves_stored_settings_unchanged() {
        let stored = Settings::default();
        let mut config = Config::from_settings(&stored);
        config.ocr.language = "jpn".into();
        let baseline = config.to_settings();

        let (next, saved) = apply_panel_edits(&config, &baseline, &baseline, stored.clone());

        assert_eq!(next.ocr.language, "jpn");
        assert_eq!(saved, stored);
    }
}
