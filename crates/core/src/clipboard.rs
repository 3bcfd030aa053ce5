//! Clipboard output.

use crate::error::{AppError, Result};
use arboard::Clipboard;
use std::sync::mpsc::{Sender, channel};
use std::thread;
use tracing::warn;

/// Receives found codes.
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

struct CopyRequest {
    text: String,
    reply: Sender<Result<()>>,
}

/// The system clipboard via `arboard`.
///
/// One `arboard::Clipboard` lives on a dedicated thread for as long as this
/// value does. On X11 the copied text is served by that instance, so it stays
/// pasteable after the poller thread that found it has exited.
pub struct SystemClipboard {
    requests: Option<Sender<CopyRequest>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let (tx, rx) = channel::<CopyRequest>();

        let spawned = thread::Builder::new()
            .name("codeclip-clipboard".to_string())
            .spawn(move || {
                let mut clipboard = None;
                for request in rx {
                    let _ = request.reply.send(write(&mut clipboard, request.text));
                }
            });

        match spawned {
            Ok(_) => Self { requests: Some(tx) },
            Err(e) => {
                warn!("Failed to start clipboard thread: {}", e);
                Self { requests: None }
            }
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn write(slot: &mut Option<Clipboard>, text: String) -> Result<()> {
    if slot.is_none() {
        let clipboard = Clipboard::new()
            .map_err(|e| AppError::clipboard(format!("Could not access clipboard: {}", e)))?;
        *slot = Some(clipboard);
    }

    match slot.as_mut() {
        Some(clipboard) => clipboard
            .set_text(text)
            .map_err(|e| AppError::clipboard(format!("Failed to copy: {}", e))),
        None => Err(AppError::clipboard("Clipboard unavailable")),
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| AppError::clipboard("Clipboard thread is not running"))?;

        let (reply, response) = channel();
        requests
            .send(CopyRequest {
                text: text.to_string(),
                reply,
            })
            .map_err(|_| AppError::clipboard("Clipboard thread is not running"))?;

        response
            .recv()
            .map_err(|_| AppError::clipboard("Clipboard thread is not running"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // Without a display the copy itself may fail; the owning thread must
    // still be there for every writer.
    #[test]
    fn clipboard_outlives_the_threads_that_write_to_it() {
        let clipboard = Arc::new(SystemClipboard::new());

        for code in ["ABC123", "XYZ789"] {
            let writer = clipboard.clone();
            let result = thread::spawn(move || writer.set_text(code))
                .join()
                .unwrap();

            if let Err(e) = result {
                assert!(
                    !e.to_string().contains("not running"),
                    "clipboard thread died: {}",
                    e
                );
            }
        }
    }
}
