//! Translation of egui input into selector events.
//!
//! The selection logic itself lives in [`crate::region::DragState`]; this
//! module only turns egui drag responses into [`PointerEvent`]s in image
//! pixel coordinates.

use crate::image_processing::ImageProcessor;
use crate::region::PointerEvent;
use eframe::egui;

/// Converts this frame's drag interaction into pointer events.
///
/// # Arguments
/// * `response` - The egui response from the full-screen interaction area
/// * `area` - The on-screen rectangle the snapshot is drawn into
/// * `image_size` - Pixel size of the snapshot
pub fn pointer_events(
    response: &egui::Response,
    area: egui::Rect,
    image_size: (u32, u32),
) -> Vec<PointerEvent> {
    let to_pixels = |pos: egui::Pos2| {
        ImageProcessor::ui_to_pixels((pos - area.min).to_pos2(), area.size(), image_size)
    };

    // The release frame may no longer carry an interaction position
    let Some(pos) = response
        .interact_pointer_pos()
        .or_else(|| response.ctx.pointer_latest_pos())
    else {
        return Vec::new();
    };
    let point = to_pixels(pos);

    let mut events = Vec::new();
    if response.drag_started() {
        events.push(PointerEvent::Down(point));
    } else if response.dragged() {
        events.push(PointerEvent::Move(point));
    }
    if response.drag_stopped() {
        events.push(PointerEvent::Up(point));
    }
    events
}

/// Whether the user asked to dismiss the overlay this frame.
pub fn dismiss_requested(ctx: &egui::Context) -> bool {
    ctx.input(|i| i.key_pressed(egui::Key::Escape) || i.viewport().close_requested())
}
