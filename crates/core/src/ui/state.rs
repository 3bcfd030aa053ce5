//! UI state types and event definitions.

use super::overlay::SelectionOverlay;
use image::DynamicImage;

/// What the monitor window is currently showing.
///
/// `Panel` -> `AwaitingSnapshot` (window hidden) -> `Selecting` (full-screen
/// overlay) -> `Panel`.
pub(crate) enum UiMode {
    /// The status panel with controls and preview.
    Panel,
    /// The window is hidden while the screen is captured.
    AwaitingSnapshot,
    /// The selection overlay over a frozen snapshot.
    Selecting(Box<SelectionOverlay>),
}

/// Result of the background snapshot taken for a new selection.
pub(crate) enum SnapshotEvent {
    Ready(DynamicImage),
    Failed(String),
}

/// How the monitor window starts.
pub enum StartMode {
    /// Open the selection overlay over this snapshot.
    Select(DynamicImage),
    /// Skip the overlay; the region is already known.
    Region(crate::region::Rectangle),
}
