//! Monitor state machine types and event definitions.

use std::fmt;
use std::time::Duration;

use image::DynamicImage;

use crate::config::PollTimings;
use crate::extract::Code;
use crate::region::Rectangle;

/// Maximum number of characters of recognized text shown in the status.
pub const TEXT_PREVIEW_CHARS: usize = 40;

/// Lifecycle of the monitor, owned by the controller.
///
/// `Idle` -> `Selecting` -> `Selected` -> `Monitoring` -> `Selected` ...;
/// `Stopped` is reached only on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No region has been selected yet.
    Idle,
    /// The selection overlay is open.
    Selecting,
    /// A region exists and no poller is running.
    Selected,
    /// The background poller is running.
    Monitoring,
    /// The application is shutting down.
    Stopped,
}

impl MonitorState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Selecting => "selecting a region",
            Self::Selected => "a region is selected",
            Self::Monitoring => "monitoring",
            Self::Stopped => "stopped",
        }
    }
}

/// What the status area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    NoRegion,
    EmptyRegion,
    RegionSelected(Rectangle),
    Started(Rectangle),
    Found {
        code: Code,
    },
    Searching {
        last_code: Option<Code>,
        preview: String,
    },
    Failed {
        message: String,
        last_code: Option<Code>,
    },
    Stopped {
        last_code: Option<Code>,
    },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "Select a region to begin"),
            Self::NoRegion => write!(f, "No region selected"),
            Self::EmptyRegion => write!(f, "Selected region is empty, select again"),
            Self::RegionSelected(rect) => write!(f, "Region selected: {}", rect),
            Self::Started(rect) => write!(f, "Monitoring {}...", rect),
            Self::Found { code } => write!(f, "Found code: {} (copied to clipboard)", code),
            Self::Searching { last_code, preview } => {
                match last_code {
                    Some(code) => write!(f, "Last code: {}", code)?,
                    None => write!(f, "No code yet")?,
                }
                if preview.is_empty() {
                    write!(f, " | Seen: (no text)")
                } else {
                    write!(f, " | Seen: {}", preview)
                }
            }
            Self::Failed { message, last_code } => {
                write!(f, "Error: {}", message)?;
                match last_code {
                    Some(code) => write!(f, " | Last code: {}", code),
                    None => Ok(()),
                }
            }
            Self::Stopped { last_code: Some(code) } => write!(f, "Stopped. Last code: {}", code),
            Self::Stopped { last_code: None } => write!(f, "Stopped. No code found"),
        }
    }
}

/// Collapses whitespace and shortens recognized text for the status line.
pub fn text_preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= TEXT_PREVIEW_CHARS {
        collapsed
    } else {
        let mut short: String = collapsed.chars().take(TEXT_PREVIEW_CHARS).collect();
        short.push('…');
        short
    }
}

/// How a single cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Found(Code),
    NoCode,
    Failed(String),
}

impl CycleOutcome {
    /// The pause that follows this outcome.
    pub fn pause(&self, timings: &PollTimings) -> Duration {
        match self {
            Self::Found(_) => timings.found,
            Self::NoCode => timings.idle,
            Self::Failed(_) => timings.failure,
        }
    }
}

/// Messages published by the background poller.
///
/// The poller is the only writer of the code and status; the foreground
/// mirrors what it receives here.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A scaled thumbnail of the latest capture.
    Preview(DynamicImage),
    /// New status text.
    Status(Status),
    /// A code was found and copied.
    CodeFound(Code),
    /// A cycle finished; the poller now pauses for `pause`.
    CycleCompleted { cycle: u64, pause: Duration },
    /// The poller exited.
    Stopped { last_code: Option<Code>, cycles: u64 },
}
