//! Screen capture functionality.
//!
//! This module provides cross-platform screen capture capabilities,
//! supporting both X11 and Wayland on Linux, as well as Windows and macOS.
//! The monitor loop only depends on the [`ScreenSource`] trait, so tests
//! can substitute an in-memory source.
//!
//! # Example
//!
//! ```ignore
//! use codeclip_core::capture::{ScreenCapturer, ScreenSource};
//! use codeclip_core::region::Rectangle;
//!
//! let capturer = ScreenCapturer::new(0)?;
//!
//! // Full screen, used for the selection snapshot
//! let screenshot = capturer.capture(None)?;
//!
//! // Only the monitored region, in the snapshot's pixel coordinates
//! let region = capturer.capture(Some(Rectangle::new(10, 20, 210, 70)))?;
//! ```

use crate::error::{AppError, Result};
use crate::image_processing::ImageProcessor;
use crate::region::Rectangle;
use image::DynamicImage;
use screenshots::Screen;

/// Something that can produce images of the screen.
pub trait ScreenSource: Send + Sync {
    /// Captures `region`, or the whole screen when `None`.
    fn capture(&self, region: Option<Rectangle>) -> Result<DynamicImage>;
}

/// Screen capturer bound to one monitor.
///
/// This struct wraps the `screenshots` crate. Rectangles are in physical
/// pixels of the monitor's full capture, the same space the selection
/// overlay produces from its snapshot. Regions are always cut out of a full
/// capture, since `capture_area` expects logical coordinates and would scale
/// them again on HiDPI displays.
pub struct ScreenCapturer {
    screens: Vec<Screen>,
    index: usize,
}

impl ScreenCapturer {
    /// Detects available screens and binds to the one at `index`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`AppError::ScreenCapture`] if enumeration fails or no screen exists
    /// - [`AppError::ScreenNotFound`] if the index is out of bounds
    pub fn new(index: usize) -> Result<Self> {
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        if screens.is_empty() {
            return Err(AppError::capture("No screens detected"));
        }
        if index >= screens.len() {
            return Err(AppError::ScreenNotFound(index));
        }

        Ok(Self { screens, index })
    }

    /// Lists available screens with their dimensions and metadata.
    pub fn list_screens(&self) -> Vec<String> {
        self.screens
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "Monitor {}: {}x{} (scale: {}){}",
                    i,
                    s.display_info.width,
                    s.display_info.height,
                    s.display_info.scale_factor,
                    if i == self.index { " [selected]" } else { "" }
                )
            })
            .collect()
    }

    /// Returns the number of available screens.
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    /// Index of the monitor this capturer reads from.
    pub fn monitor_index(&self) -> usize {
        self.index
    }

    fn screen(&self) -> Result<&Screen> {
        self.screens
            .get(self.index)
            .ok_or(AppError::ScreenNotFound(self.index))
    }
}

impl ScreenSource for ScreenCapturer {
    fn capture(&self, region: Option<Rectangle>) -> Result<DynamicImage> {
        let screen = self.screen()?;

        let captured = screen
            .capture()
            .map_err(|e| AppError::capture(format!("Failed to capture screen: {}", e)))?;

        // Convert screenshots::Image to image::DynamicImage
        let width = captured.width();
        let height = captured.height();
        let rgba_data = captured.into_raw();

        let img_buffer = image::ImageBuffer::from_raw(width, height, rgba_data)
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))?;
        let full = DynamicImage::ImageRgba8(img_buffer);

        match region {
            None => Ok(full),
            Some(rect) => cut_region(&full, rect),
        }
    }
}

/// Cuts a physical-pixel `rect` out of a full-monitor capture.
fn cut_region(full: &DynamicImage, rect: Rectangle) -> Result<DynamicImage> {
    if rect.is_empty() {
        return Err(AppError::EmptySelection);
    }
    ImageProcessor::crop(full, rect)
}
