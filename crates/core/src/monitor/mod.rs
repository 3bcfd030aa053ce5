//! Region monitoring.
//!
//! - [`state`]: monitor states, status lines and poller events
//! - [`worker`]: the background capture/recognize/extract loop
//! - [`controller`]: the foreground state machine owning the poller

mod controller;
mod state;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::MonitorController;
pub use state::{CycleOutcome, MonitorEvent, MonitorState, Status, TEXT_PREVIEW_CHARS, text_preview};
pub use worker::{MonitorWorker, Waker};
