//! Image processing utilities.
//!
//! This module handles cropping frozen snapshots, scaling preview
//! thumbnails, and converting between UI and image coordinates.
//!
//! # Coordinate Mapping
//!
//! The UI displays images at logical pixel sizes (e.g., 1920x1080) while
//! the actual captured image may be at a different resolution (e.g., 3840x2160).
//! Selection happens in UI space; rectangles are stored in image space.

use crate::error::{AppError, Result};
use crate::region::{Point, Rectangle};
use eframe::egui;
use image::DynamicImage;

/// Image processing utilities for the selection and monitoring workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Maps a pointer position in UI coordinates to an image pixel, clamped
    /// to the image bounds.
    pub fn ui_to_pixels(pos: egui::Pos2, ui_size: egui::Vec2, image_size: (u32, u32)) -> Point {
        // Calculate scaling factors between UI and image coordinates
        let scale_x = image_size.0 as f32 / ui_size.x.max(1.0);
        let scale_y = image_size.1 as f32 / ui_size.y.max(1.0);

        let x = (pos.x * scale_x).round().clamp(0.0, image_size.0 as f32);
        let y = (pos.y * scale_y).round().clamp(0.0, image_size.1 as f32);

        Point::new(x as i32, y as i32)
    }

    /// Maps an image-space rectangle back to UI coordinates for drawing.
    pub fn pixels_to_ui(rect: Rectangle, ui_size: egui::Vec2, image_size: (u32, u32)) -> egui::Rect {
        let scale_x = ui_size.x / image_size.0.max(1) as f32;
        let scale_y = ui_size.y / image_size.1.max(1) as f32;

        egui::Rect::from_min_max(
            egui::pos2(rect.x1() as f32 * scale_x, rect.y1() as f32 * scale_y),
            egui::pos2(rect.x2() as f32 * scale_x, rect.y2() as f32 * scale_y),
        )
    }

    /// Crops `rect` out of a snapshot, clamped to the image bounds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EmptySelection`] if nothing of the rectangle lies
    /// inside the image.
    pub fn crop(original: &DynamicImage, rect: Rectangle) -> Result<DynamicImage> {
        let x = rect.x1().max(0) as u32;
        let y = rect.y1().max(0) as u32;
        let x2 = (rect.x2().max(0) as u32).min(original.width());
        let y2 = (rect.y2().max(0) as u32).min(original.height());

        let width = x2.saturating_sub(x);
        let height = y2.saturating_sub(y);

        // Validate selection has non-zero area
        if width == 0 || height == 0 {
            return Err(AppError::EmptySelection);
        }

        Ok(original.crop_imm(x, y, width, height))
    }

    /// Dimensions that fit `(width, height)` inside `max`, keeping the
    /// aspect ratio and never enlarging.
    pub fn fit_within(width: u32, height: u32, max: (u32, u32)) -> (u32, u32) {
        if width <= max.0 && height <= max.1 {
            return (width, height);
        }

        let ratio = f64::min(
            max.0 as f64 / width as f64,
            max.1 as f64 / height as f64,
        );
        let w = ((width as f64 * ratio).round() as u32).clamp(1, max.0);
        let h = ((height as f64 * ratio).round() as u32).clamp(1, max.1);
        (w, h)
    }

    /// Scales a captured region down for the preview panel.
    ///
    /// The preview is display-only; recognition always uses the full capture.
    pub fn preview(image: &DynamicImage, max: (u32, u32)) -> DynamicImage {
        let (w, h) = Self::fit_within(image.width(), image.height(), max);
        if (w, h) == (image.width(), image.height()) {
            image.clone()
        } else {
            image.thumbnail_exact(w, h)
        }
    }

    /// Converts an image to egui's texture format.
    pub fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
        let image_buffer = image.to_rgba8();
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image_buffer.as_flat_samples();
        egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
    }
}
