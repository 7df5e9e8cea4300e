//! App shell: mirrored live preview, capture control, result overlay, and
//! error banner. Owns the session state and the capture source; recognition
//! runs on the backend worker.

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use capture::FrameSource;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::session::{RecognitionOutcome, SessionState};

const PREVIEW_MAX_WIDTH: f32 = 880.0;

pub struct GestureApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    source: Box<dyn FrameSource>,
    session: SessionState,
    status: String,
    preview_texture: Option<egui::TextureHandle>,
}

impl GestureApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        source: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            source,
            session: SessionState::new(),
            status: "Camera off".to_string(),
            preview_texture: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::BackendStartupFailed(message) => {
                    self.status = format!("Backend startup failed: {message}");
                }
                UiEvent::RecognitionFinished {
                    generation,
                    outcome,
                } => {
                    self.session.apply_outcome(generation, outcome);
                }
            }
        }
    }

    fn enable_camera(&mut self) {
        match self.source.enable() {
            Ok(()) => {
                self.session.set_camera(true);
                self.status = "Camera on".to_string();
            }
            Err(err) => {
                tracing::warn!("camera enable failed: {err}");
                self.status = format!("Camera unavailable: {err}");
            }
        }
    }

    fn disable_camera(&mut self) {
        self.source.disable();
        self.session.set_camera(false);
        self.preview_texture = None;
        self.status = "Camera off".to_string();
    }

    fn trigger_capture(&mut self) {
        if !self.source.is_enabled() {
            return;
        }
        let Some(generation) = self.session.begin_capture() else {
            return;
        };

        match self.source.capture_frame() {
            Some(frame) => {
                let queued = dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::Recognize { generation, frame },
                    &mut self.status,
                );
                if !queued {
                    self.session
                        .apply_outcome(generation, RecognitionOutcome::Failed(self.status.clone()));
                }
            }
            None => {
                tracing::warn!("capture produced no frame");
                self.session
                    .apply_outcome(generation, RecognitionOutcome::Miss);
            }
        }
    }

    fn show_error_banner(&mut self, ui: &mut egui::Ui) {
        let Some(message) = self.session.error_message().map(str::to_string) else {
            return;
        };

        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                    if ui.button("Dismiss").clicked() {
                        self.session.dismiss_error();
                    }
                });
            });
    }

    fn show_preview(&mut self, ui: &mut egui::Ui) {
        if !self.session.camera_enabled() {
            ui.add_space(80.0);
            ui.label(egui::RichText::new("Camera is off").weak());
            ui.add_space(80.0);
            return;
        }

        if let Some(preview) = self.source.preview_frame() {
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [preview.width, preview.height],
                &preview.rgba,
            );
            match &mut self.preview_texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.preview_texture = Some(ui.ctx().load_texture(
                        "camera-preview",
                        image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }
        }

        let Some(texture) = &self.preview_texture else {
            ui.add_space(80.0);
            ui.label(egui::RichText::new("Waiting for the first frame...").weak());
            ui.add_space(80.0);
            return;
        };

        let size = texture.size_vec2();
        let scale = (ui.available_width().min(PREVIEW_MAX_WIDTH) / size.x).min(1.0);
        let response = ui.add(egui::Image::new(texture).fit_to_exact_size(size * scale));

        // Result overlay, painted over the live feed like the big pop-in
        // number in the original layout.
        if let Some(number) = self.session.result() {
            ui.painter().text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                number.to_string(),
                egui::FontId::proportional(160.0),
                egui::Color32::WHITE,
            );
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if !self.session.camera_enabled() {
                let start = egui::Button::new(egui::RichText::new("Start Camera").strong())
                    .min_size(egui::vec2(150.0, 40.0));
                if ui.add(start).clicked() {
                    self.enable_camera();
                }
            } else {
                let label = if self.session.loading() {
                    "Recognizing..."
                } else {
                    "Capture Gesture"
                };
                let capture = egui::Button::new(egui::RichText::new(label).strong())
                    .min_size(egui::vec2(170.0, 48.0));
                if ui.add_enabled(!self.session.loading(), capture).clicked() {
                    self.trigger_capture();
                }
                if self.session.loading() {
                    ui.add(egui::Spinner::new());
                }
                let stop = egui::Button::new("Stop Camera").min_size(egui::vec2(120.0, 40.0));
                if ui.add(stop).clicked() {
                    self.disable_camera();
                }
            }
        });
        ui.horizontal(|ui| {
            ui.small("Status:");
            ui.small(egui::RichText::new(&self.status).weak());
        });
        ui.add_space(6.0);
    }
}

impl eframe::App for GestureApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            self.show_controls(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading("Gesture to Number");
                ui.label("Show a hand gesture for a number from 1 to 10 and let the model guess it.");
                ui.add_space(8.0);
                self.show_error_banner(ui);
                ui.add_space(8.0);
                self.show_preview(ui);
            });
        });

        // Keep the preview live while the camera is on.
        if self.session.camera_enabled() {
            ctx.request_repaint_after(std::time::Duration::from_millis(33));
        }
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
