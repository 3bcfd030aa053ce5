//! Stand-alone region picker used by the one-shot mode.

use super::overlay::SelectionOverlay;
use crate::error::{AppError, Result};
use crate::region::Rectangle;
use eframe::egui;
use image::DynamicImage;
use std::sync::{Arc, Mutex};

struct RegionPicker {
    overlay: SelectionOverlay,
    result: Arc<Mutex<Option<Rectangle>>>,
    done: bool,
}

impl eframe::App for RegionPicker {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.done {
            return;
        }

        if let Some(selection) = self.overlay.show(ctx) {
            if let Ok(mut slot) = self.result.lock() {
                *slot = selection;
            }
            self.done = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

/// Shows the overlay over `snapshot` and returns when it closes.
///
/// # Returns
/// The selected rectangle in snapshot pixels, or `None` if dismissed.
pub fn run(snapshot: DynamicImage) -> Result<Option<Rectangle>> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_decorations(false)
            .with_always_on_top(),
        ..Default::default()
    };

    let result = Arc::new(Mutex::new(None));
    let app_result = result.clone();

    eframe::run_native(
        "codeclip selection",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(RegionPicker {
                overlay: SelectionOverlay::new(&snapshot),
                result: app_result,
                done: false,
            }) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))?;

    // Extract result from shared state
    let selection = *result
        .lock()
        .map_err(|_| AppError::ui("Failed to acquire result lock"))?;
    Ok(selection)
}
