//! UI rendering helpers and overlay components.
//!
//! This module contains reusable rendering functions for the selection
//! overlay: the dark cutout effect, the selection border and labels.

use eframe::egui;

/// Draws the dark overlay with a transparent "cutout" for the selection area.
///
/// Creates a visual effect where the selected region is clear/bright while
/// the rest of the screen is dimmed.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `screen_rect` - The full screen rectangle
/// * `selection_rect` - The selected area to keep clear
/// * `alpha` - Darkness level (0-255, higher = darker)
pub fn draw_selection_overlay(
    painter: &egui::Painter,
    screen_rect: egui::Rect,
    selection_rect: egui::Rect,
    alpha: u8,
) {
    let color = egui::Color32::from_black_alpha(alpha);

    // Top region (above selection)
    painter.rect_filled(
        egui::Rect::from_min_max(
            screen_rect.min,
            egui::pos2(screen_rect.max.x, selection_rect.min.y),
        ),
        0.0,
        color,
    );

    // Bottom region (below selection)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(screen_rect.min.x, selection_rect.max.y),
            screen_rect.max,
        ),
        0.0,
        color,
    );

    // Left region (left of selection, between top and bottom)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(screen_rect.min.x, selection_rect.min.y),
            egui::pos2(selection_rect.min.x, selection_rect.max.y),
        ),
        0.0,
        color,
    );

    // Right region (right of selection, between top and bottom)
    painter.rect_filled(
        egui::Rect::from_min_max(
            egui::pos2(selection_rect.max.x, selection_rect.min.y),
            egui::pos2(screen_rect.max.x, selection_rect.max.y),
        ),
        0.0,
        color,
    );
}

/// Draws a border around the selection rectangle.
pub fn draw_selection_border(
    painter: &egui::Painter,
    selection_rect: egui::Rect,
    stroke_width: f32,
    color: egui::Color32,
) {
    painter.rect_stroke(
        selection_rect,
        0.0,
        egui::Stroke::new(stroke_width, color),
        egui::StrokeKind::Middle,
    );
}

/// Draws text on a dark rounded background.
pub fn draw_label(painter: &egui::Painter, pos: egui::Pos2, anchor: egui::Align2, text: &str) {
    let galley = painter.layout_no_wrap(
        text.to_string(),
        egui::FontId::proportional(14.0),
        egui::Color32::WHITE,
    );
    let text_rect = anchor.anchor_size(pos, galley.size());
    painter.rect_filled(text_rect.expand(4.0), 4.0, egui::Color32::from_black_alpha(200));
    painter.galley(text_rect.min, galley, egui::Color32::WHITE);
}

/// Calculates where to put the size label of a selection.
///
/// Below the selection by default, above it when there isn't enough space
/// below.
///
/// # Returns
/// A tuple of (position, anchor alignment)
pub fn label_position(
    selection_rect: egui::Rect,
    screen_rect: egui::Rect,
    spacing: f32,
    min_space_needed: f32,
) -> (egui::Pos2, egui::Align2) {
    let x = selection_rect.min.x.max(screen_rect.min.x + spacing);

    let below = selection_rect.max.y + spacing;
    let space_below = screen_rect.max.y - below;
    if space_below < min_space_needed && selection_rect.min.y > space_below {
        (egui::pos2(x, selection_rect.min.y - spacing), egui::Align2::LEFT_BOTTOM)
    } else {
        (egui::pos2(x, below), egui::Align2::LEFT_TOP)
    }
}
