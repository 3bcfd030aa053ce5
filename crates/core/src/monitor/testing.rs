//! In-memory collaborators for monitor tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;
use tokio_util::sync::CancellationToken;

use crate::capture::ScreenSource;
use crate::clipboard::ClipboardSink;
use crate::error::{AppError, Result};
use crate::ocr::Recognizer;
use crate::region::Rectangle;

/// Returns a blank image sized like the requested region, or always fails.
pub struct StaticSource {
    fail: bool,
    captures: AtomicUsize,
}

impl StaticSource {
    pub fn ok() -> Self {
        Self {
            fail: false,
            captures: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            captures: AtomicUsize::new(0),
        }
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl ScreenSource for StaticSource {
    fn capture(&self, region: Option<Rectangle>) -> Result<DynamicImage> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::capture("display gone"));
        }
        let (w, h) = region.map_or((640, 480), |r| (r.width(), r.height()));
        Ok(DynamicImage::new_rgba8(w.max(1), h.max(1)))
    }
}

/// Replays scripted texts; once the script runs out, repeats the last one.
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    fail_first: usize,
    calls: AtomicUsize,
    cancel_on: Option<(usize, CancellationToken)>,
}

impl ScriptedRecognizer {
    pub fn new<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            script: Mutex::new(texts.into_iter().map(Into::into).collect()),
            last: Mutex::new(String::new()),
            fail_first: 0,
            calls: AtomicUsize::new(0),
            cancel_on: None,
        }
    }

    /// The first `n` calls fail before the script is consulted.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Cancels `token` during the `call`-th recognition (1-based).
    pub fn cancel_on_call(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on = Some((call, token));
        self
    }
}

impl Recognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, token)) = &self.cancel_on {
            if call == *n {
                token.cancel();
            }
        }
        if call <= self.fail_first {
            return Err(AppError::recognition("engine crashed"));
        }

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(last.clone())
    }
}

/// Records every clipboard write, or rejects them all.
#[derive(Default)]
pub struct RecordingClipboard {
    writes: Mutex<Vec<String>>,
    broken: bool,
}

impl RecordingClipboard {
    pub fn broken() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            broken: true,
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ClipboardSink for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        if self.broken {
            return Err(AppError::clipboard("no clipboard in tests"));
        }
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
