//! Text recognition.
//!
//! The monitor loop treats OCR as an opaque `image -> text` function behind
//! the [`Recognizer`] trait. The production implementation calls the
//! `tesseract` executable through `rusty_tesseract`.

use crate::config::OcrConfig;
use crate::error::{AppError, Result};
use image::DynamicImage;
use rusty_tesseract::{Args, Image};

/// Turns an image into recognized text.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// Tesseract with a fixed language and page segmentation mode.
#[derive(Clone, Debug)]
pub struct TesseractCli {
    language: String,
    page_seg_mode: u8,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            page_seg_mode: config.page_seg_mode,
        }
    }

    fn args(&self) -> Args {
        Args {
            lang: self.language.clone(),
            psm: Some(i32::from(self.page_seg_mode)),
            ..Args::default()
        }
    }

    /// Returns the installed tesseract version.
    ///
    /// Used at startup to report a missing engine before monitoring begins.
    pub fn version(&self) -> Result<String> {
        rusty_tesseract::get_tesseract_version()
            .map(|v| v.trim().to_string())
            .map_err(|e| AppError::recognition(format!("tesseract is not available: {}", e)))
    }
}

impl Recognizer for TesseractCli {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let input = Image::from_dynamic_image(image)
            .map_err(|e| AppError::image(format!("Failed to prepare image for OCR: {}", e)))?;

        rusty_tesseract::image_to_string(&input, &self.args())
            .map_err(|e| AppError::recognition(e.to_string()))
    }
}
