//! codeclip Core Library
//!
//! Watches a region of the screen with OCR and copies six-character codes
//! (three uppercase letters followed by three digits, e.g. `ABC123`) to the
//! clipboard as soon as they appear.
//!
//! # Overview
//!
//! - **Region selection**: drag-to-select state machine in [`region`], drawn
//!   by the overlay in [`ui`]
//! - **Monitoring**: a single background poller driven by
//!   [`monitor::MonitorController`]
//! - **Extraction**: pure code extraction with `0`/`O` correction in
//!   [`extract`]
//! - **Collaborators**: screen capture ([`capture`]), OCR ([`ocr`]) and
//!   clipboard ([`clipboard`]) behind small traits
//!
//! # Quick Start
//!
//! ```ignore
//! use codeclip_core::CodeClip;
//!
//! // Initialize with environment configuration
//! let app = CodeClip::new()?;
//!
//! // Select a region on the configured monitor and start the status panel
//! app.run_interactive()?;
//! ```
//!
//! # Module Structure
//!
//! - [`capture`]: Screen capture functionality
//! - [`clipboard`]: Clipboard output
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`extract`]: Code extraction from recognized text
//! - [`image_processing`]: Cropping, previews and coordinate mapping
//! - [`monitor`]: The monitor loop and its controller
//! - [`ocr`]: Text recognition
//! - [`region`]: Rectangles and the selection state machine
//! - [`settings`]: Persisted user preferences
//! - [`ui`]: User interface components

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod extract;
pub mod image_processing;
pub mod monitor;
pub mod ocr;
pub mod region;
pub mod settings;
pub mod ui;

// Re-export primary types for convenience
pub use capture::{ScreenCapturer, ScreenSource};
pub use clipboard::{ClipboardSink, SystemClipboard};
pub use config::{Config, PollTimings};
pub use error::{AppError, Result};
pub use extract::{Code, Extraction, extract_code};
pub use monitor::{MonitorController, MonitorEvent, MonitorState, Status};
pub use ocr::{Recognizer, TesseractCli};
pub use region::Rectangle;

use image::DynamicImage;
use image_processing::ImageProcessor;
use std::sync::Arc;

/// Monitor controller wired to the real screen, tesseract and clipboard.
pub type SystemController = MonitorController<ScreenCapturer, TesseractCli, SystemClipboard>;

/// Outcome of a one-shot scan.
#[derive(Debug, Clone)]
pub struct OneShot {
    /// The region that was scanned, in snapshot pixels.
    pub region: Rectangle,
    /// Recognized text and code.
    pub extraction: Extraction,
}

/// Main entry point for the codeclip application.
///
/// This struct provides a facade over the various subsystems,
/// handling initialization and orchestration.
pub struct CodeClip {
    config: Config,
    capturer: ScreenCapturer,
}

impl CodeClip {
    /// Creates a new instance with configuration from settings and
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is malformed or screen capture
    /// initialization fails (e.g., no display available).
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::with_config(config)
    }

    /// Creates an instance with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if screen capture initialization fails or the
    /// configured monitor does not exist.
    pub fn with_config(config: Config) -> Result<Self> {
        let capturer = ScreenCapturer::new(config.monitor_index)?;
        Ok(Self { config, capturer })
    }

    /// Lists available monitors with their dimensions.
    pub fn list_monitors(&self) -> Vec<String> {
        self.capturer.list_screens()
    }

    /// Returns the number of available monitors.
    pub fn monitor_count(&self) -> usize {
        self.capturer.screen_count()
    }

    /// Returns the tesseract version, failing if the engine is missing.
    pub fn check_ocr(&self) -> Result<String> {
        TesseractCli::new(&self.config.ocr).version()
    }

    /// Captures the monitor, opens the selection overlay and then the status
    /// panel. Returns when the window is closed.
    pub fn run_interactive(self) -> Result<()> {
        let snapshot = self.capturer.capture(None)?;
        ui::run_monitor_app(self.config, self.capturer, ui::StartMode::Select(snapshot))
    }

    /// Opens the status panel with `region` already selected.
    pub fn run_with_region(self, region: Rectangle) -> Result<()> {
        ui::run_monitor_app(self.config, self.capturer, ui::StartMode::Region(region))
    }

    /// Selects a region on a frozen snapshot and scans it once.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoRegion`] if the overlay is dismissed.
    pub fn run_once(&self) -> Result<OneShot> {
        let snapshot = self.capturer.capture(None)?;
        let region = ui::select_region(snapshot.clone())?.ok_or(AppError::NoRegion)?;
        let recognizer = TesseractCli::new(&self.config.ocr);
        let extraction = scan_snapshot(&snapshot, region, &recognizer)?;
        Ok(OneShot { region, extraction })
    }

    /// Builds a controller for monitoring without a window.
    pub fn into_controller(self) -> SystemController {
        MonitorController::new(
            Arc::new(self.capturer),
            Arc::new(TesseractCli::new(&self.config.ocr)),
            Arc::new(SystemClipboard::new()),
            &self.config,
        )
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Crops `region` out of a snapshot, recognizes it and extracts a code.
pub fn scan_snapshot<R: Recognizer + ?Sized>(
    snapshot: &DynamicImage,
    region: Rectangle,
    recognizer: &R,
) -> Result<Extraction> {
    let cropped = ImageProcessor::crop(snapshot, region)?;
    let text = recognizer.recognize(&cropped)?;
    Ok(extract_code(&text))
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
pub fn init() {
    let _ = dotenvy::dotenv();
}
