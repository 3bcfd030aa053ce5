//! The full-screen selection overlay.
//!
//! Shows a frozen snapshot with a crosshair cursor and lets the user drag a
//! rectangle over it. Shared by the monitor app and the one-shot picker.

use super::rendering::{draw_label, draw_selection_border, draw_selection_overlay, label_position};
use super::selection::{dismiss_requested, pointer_events};
use crate::image_processing::ImageProcessor;
use crate::region::{DragState, PointerEvent, Rectangle};
use eframe::egui;
use image::DynamicImage;

const DIM_ALPHA: u8 = 150;
const HINT: &str = "Drag over the code area · Esc to cancel";

pub struct SelectionOverlay {
    texture: Option<egui::TextureHandle>,
    /// Pre-converted image data for fast texture upload
    color_image: Option<egui::ColorImage>,
    image_size: (u32, u32),
    drag: DragState,
}

impl SelectionOverlay {
    pub fn new(snapshot: &DynamicImage) -> Self {
        Self {
            texture: None,
            color_image: Some(ImageProcessor::to_color_image(snapshot)),
            image_size: (snapshot.width(), snapshot.height()),
            drag: DragState::Idle,
        }
    }

    /// Draws the overlay for one frame.
    ///
    /// Returns `Some(result)` once the selection has ended: `Some(rect)` on
    /// release, `None` if it was dismissed.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<Option<Rectangle>> {
        // Upload texture on first frame using pre-converted data
        if self.texture.is_none() {
            if let Some(color_image) = self.color_image.take() {
                self.texture = Some(ctx.load_texture(
                    "snapshot",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        // Fullscreen panel with no margins
        let panel_frame = egui::Frame::default()
            .inner_margin(egui::Margin::same(0))
            .outer_margin(egui::Margin::same(0));

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let area = ui.max_rect();

                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        area,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                let response = ui.interact(area, ui.id().with("selection"), egui::Sense::drag());
                ctx.set_cursor_icon(egui::CursorIcon::Crosshair);

                for event in pointer_events(&response, area, self.image_size) {
                    self.drag = self.drag.next(event);
                }
                if dismiss_requested(ctx) {
                    self.drag = self.drag.next(PointerEvent::Dismiss);
                }

                self.paint(ui.painter(), area);
            });

        self.drag.is_finished().then(|| self.drag.committed())
    }

    fn paint(&self, painter: &egui::Painter, area: egui::Rect) {
        match self.drag.preview() {
            Some(rect) => {
                let local = ImageProcessor::pixels_to_ui(rect, area.size(), self.image_size)
                    .translate(area.min.to_vec2());

                draw_selection_overlay(painter, area, local, DIM_ALPHA);
                draw_selection_border(painter, local, 2.0, egui::Color32::RED);

                let (pos, anchor) = label_position(local, area, 8.0, 30.0);
                draw_label(
                    painter,
                    pos,
                    anchor,
                    &format!("{} × {} px", rect.width(), rect.height()),
                );
            }
            None => {
                painter.rect_filled(area, 0.0, egui::Color32::from_black_alpha(DIM_ALPHA / 2));
                draw_label(
                    painter,
                    area.center_top() + egui::vec2(0.0, 24.0),
                    egui::Align2::CENTER_TOP,
                    HINT,
                );
            }
        }
    }
}
