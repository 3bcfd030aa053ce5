//! User interface components for codeclip.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: UI modes and event definitions
//! - [`selection`]: egui input → selector events
//! - [`rendering`]: Drawing utilities for overlays and borders
//! - [`overlay`]: The full-screen selection overlay
//! - [`monitor_app`]: The monitor window (overlay + status panel)
//! - [`region_picker`]: One-shot overlay returning a rectangle
//!
//! # Usage
//!
//! ```ignore
//! use codeclip_core::{ui, Config, ScreenCapturer, ScreenSource};
//!
//! let config = Config::load()?;
//! let capturer = ScreenCapturer::new(config.monitor_index)?;
//! let snapshot = capturer.capture(None)?;
//!
//! ui::run_monitor_app(config, capturer, ui::StartMode::Select(snapshot))?;
//! ```

mod monitor_app;
mod overlay;
mod region_picker;
mod rendering;
mod selection;
mod state;

// Public API exports
pub use monitor_app::MonitorApp;
pub use state::StartMode;

use crate::capture::ScreenCapturer;
use crate::config::Config;
use crate::error::Result;
use crate::region::Rectangle;
use image::DynamicImage;

/// Opens the monitor window and returns when it is closed.
pub fn run_monitor_app(config: Config, capturer: ScreenCapturer, start: StartMode) -> Result<()> {
    monitor_app::run(config, capturer, start)
}

/// Shows the selection overlay over `snapshot`.
///
/// # Returns
/// - `Ok(Some(rect))` - the committed rectangle in snapshot pixels
/// - `Ok(None)` - the overlay was dismissed
/// - `Err(e)` - the UI could not be launched
pub fn select_region(snapshot: DynamicImage) -> Result<Option<Rectangle>> {
    region_picker::run(snapshot)
}
