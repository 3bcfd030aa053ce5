//! The background polling loop.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{CycleOutcome, MonitorEvent, Status, text_preview};
use crate::capture::ScreenSource;
use crate::clipboard::ClipboardSink;
use crate::config::PollTimings;
use crate::error::Result;
use crate::extract::{Code, Extraction, extract_code};
use crate::image_processing::ImageProcessor;
use crate::ocr::Recognizer;
use crate::region::Rectangle;

/// Called after every published event so a UI can schedule a repaint.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Runs capture → recognize → extract cycles over one region.
///
/// The worker owns the last known code and the cycle count; everyone else
/// learns about them through [`MonitorEvent`]s.
pub struct MonitorWorker<S: ?Sized, R: ?Sized, C: ?Sized> {
    source: Arc<S>,
    recognizer: Arc<R>,
    clipboard: Arc<C>,
    region: Rectangle,
    timings: PollTimings,
    preview_max: (u32, u32),
    events: Sender<MonitorEvent>,
    waker: Option<Waker>,
    last_code: Option<Code>,
    cycles: u64,
}

impl<S, R, C> MonitorWorker<S, R, C>
where
    S: ScreenSource + ?Sized,
    R: Recognizer + ?Sized,
    C: ClipboardSink + ?Sized,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<S>,
        recognizer: Arc<R>,
        clipboard: Arc<C>,
        region: Rectangle,
        timings: PollTimings,
        preview_max: (u32, u32),
        events: Sender<MonitorEvent>,
    ) -> Self {
        Self {
            source,
            recognizer,
            clipboard,
            region,
            timings,
            preview_max,
            events,
            waker: None,
            last_code: None,
            cycles: 0,
        }
    }

    /// Carries the code found by a previous run into this one.
    pub fn with_last_code(mut self, code: Option<Code>) -> Self {
        self.last_code = code;
        self
    }

    pub fn with_waker(mut self, waker: Option<Waker>) -> Self {
        self.waker = waker;
        self
    }

    pub fn last_code(&self) -> Option<&Code> {
        self.last_code.as_ref()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs cycles until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles, after the pause that
    /// follows each one, so a running capture is never interrupted. A failed
    /// cycle never ends the loop.
    pub async fn run(mut self, cancel: CancellationToken) -> Option<Code> {
        info!("Monitoring region {}", self.region);

        while !cancel.is_cancelled() {
            let outcome = self.run_cycle();
            let pause = outcome.pause(&self.timings);
            self.publish(MonitorEvent::CycleCompleted {
                cycle: self.cycles,
                pause,
            });
            tokio::time::sleep(pause).await;
        }

        info!(cycles = self.cycles, "Monitoring stopped");
        self.finish()
    }

    /// Reports a poller that could not run at all, then exits like a stop.
    pub fn abandon(self, reason: String) -> Option<Code> {
        warn!("Monitor could not start: {}", reason);
        self.publish(MonitorEvent::Status(Status::Failed {
            message: reason,
            last_code: self.last_code.clone(),
        }));
        self.finish()
    }

    fn finish(self) -> Option<Code> {
        self.publish(MonitorEvent::Status(Status::Stopped {
            last_code: self.last_code.clone(),
        }));
        self.publish(MonitorEvent::Stopped {
            last_code: self.last_code.clone(),
            cycles: self.cycles,
        });
        self.last_code
    }

    /// Performs one cycle and publishes its results; never fails.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.cycles += 1;

        match self.observe() {
            Ok(Extraction { code: Some(code), .. }) => {
                info!(cycle = self.cycles, "Found code {}", code);
                self.last_code = Some(code.clone());

                if let Err(e) = self.clipboard.set_text(code.as_str()) {
                    warn!("Failed to copy {} to clipboard: {}", code, e);
                }

                self.publish(MonitorEvent::CodeFound(code.clone()));
                self.publish(MonitorEvent::Status(Status::Found { code: code.clone() }));
                CycleOutcome::Found(code)
            }
            Ok(Extraction { text, code: None }) => {
                debug!(cycle = self.cycles, "No code in {} chars of text", text.len());
                self.publish(MonitorEvent::Status(Status::Searching {
                    last_code: self.last_code.clone(),
                    preview: text_preview(&text),
                }));
                CycleOutcome::NoCode
            }
            Err(e) => {
                let message = e.to_string();
                warn!(cycle = self.cycles, "Cycle failed: {}", message);
                self.publish(MonitorEvent::Status(Status::Failed {
                    message: message.clone(),
                    last_code: self.last_code.clone(),
                }));
                CycleOutcome::Failed(message)
            }
        }
    }

    fn observe(&self) -> Result<Extraction> {
        let image = self.source.capture(Some(self.region))?;
        self.publish(MonitorEvent::Preview(ImageProcessor::preview(
            &image,
            self.preview_max,
        )));

        let text = self.recognizer.recognize(&image)?;
        Ok(extract_code(&text))
    }

    fn publish(&self, event: MonitorEvent) {
        // The receiver is gone only when the controller was dropped
        let _ = self.events.send(event);
        if let Some(waker) = &self.waker {
            waker();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::testing::{RecordingClipboard, ScriptedRecognizer, StaticSource};
    use std::sync::mpsc::{Receiver, channel};
    use std::time::Duration;

    type TestWorker = MonitorWorker<StaticSource, ScriptedRecognizer, RecordingClipboard>;

    fn timings() -> PollTimings {
        PollTimings {
            found: Duration::from_secs(3),
            idle: Duration::from_secs(1),
            failure: Duration::from_secs(5),
        }
    }

    fn worker(
        source: StaticSource,
        recognizer: ScriptedRecognizer,
    ) -> (TestWorker, Arc<RecordingClipboard>, Receiver<MonitorEvent>) {
        let (tx, rx) = channel();
        let clipboard = Arc::new(RecordingClipboard::default());
        let worker = MonitorWorker::new(
            Arc::new(source),
            Arc::new(recognizer),
            clipboard.clone(),
            Rectangle::new(0, 0, 64, 16),
            timings(),
            (32, 32),
            tx,
        );
        (worker, clipboard, rx)
    }

    fn statuses(rx: &Receiver<MonitorEvent>) -> Vec<Status> {
        rx.try_iter()
            .filter_map(|event| match event {
                MonitorEvent::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn found_code_is_copied_and_reported() {
        let (mut worker, clipboard, rx) =
            worker(StaticSource::ok(), ScriptedRecognizer::new(["Code: 0BC123\n"]));

        let outcome = worker.run_cycle();
        let code = Code::parse("OBC123").unwrap();

        assert_eq!(outcome, CycleOutcome::Found(code.clone()));
        assert_eq!(outcome.pause(&timings()), Duration::from_secs(3));
        assert_eq!(clipboard.writes(), ["OBC123"]);
        assert_eq!(worker.last_code(), Some(&code));

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(&events[0], MonitorEvent::Preview(img) if img.width() <= 32));
        assert!(matches!(&events[1], MonitorEvent::CodeFound(c) if *c == code));
        assert!(matches!(&events[2], MonitorEvent::Status(Status::Found { .. })));
    }

    #[test]
    fn searching_keeps_last_code() {
        let (mut worker, clipboard, rx) = worker(
            StaticSource::ok(),
            ScriptedRecognizer::new(["XYZ789", "just some\n  words"]),
        );

        worker.run_cycle();
        let outcome = worker.run_cycle();

        assert_eq!(outcome, CycleOutcome::NoCode);
        assert_eq!(clipboard.writes(), ["XYZ789"]);
        assert_eq!(
            statuses(&rx).last(),
            Some(&Status::Searching {
                last_code: Code::parse("XYZ789"),
                preview: "just some words".into(),
            })
        );
    }

    #[test]
    fn malformed_candidates_never_reach_the_clipboard() {
        let (mut worker, clipboard, _rx) = worker(
            StaticSource::ok(),
            ScriptedRecognizer::new(["1AB234", "abc123", "AB1234"]),
        );

        for _ in 0..3 {
            assert_eq!(worker.run_cycle(), CycleOutcome::NoCode);
        }
        assert!(clipboard.writes().is_empty());
        assert_eq!(worker.last_code(), None);
    }

    #[test]
    fn capture_failure_is_reported_not_raised() {
        let (mut worker, clipboard, rx) =
            worker(StaticSource::failing(), ScriptedRecognizer::new(["ABC123"]));

        let outcome = worker.run_cycle();

        assert!(matches!(outcome, CycleOutcome::Failed(ref m) if m.contains("display gone")));
        assert_eq!(outcome.pause(&timings()), Duration::from_secs(5));
        assert!(clipboard.writes().is_empty());
        assert!(matches!(statuses(&rx).as_slice(), [Status::Failed { .. }]));
        assert_eq!(worker.cycles(), 1);
    }

    #[test]
    fn clipboard_failure_does_not_fail_the_cycle() {
        let (tx, _rx) = channel();
        let clipboard = Arc::new(RecordingClipboard::broken());
        let mut worker = MonitorWorker::new(
            Arc::new(StaticSource::ok()),
            Arc::new(ScriptedRecognizer::new(["ABC123"])),
            clipboard,
            Rectangle::new(0, 0, 8, 8),
            timings(),
            (32, 32),
            tx,
        );

        assert!(matches!(worker.run_cycle(), CycleOutcome::Found(_)));
        assert_eq!(worker.last_code().map(Code::as_str), Some("ABC123"));
    }

    #[tokio::test(start_paused = true)]
    async fn every_failure_gets_one_recovery_pause_and_another_attempt() {
        let cancel = CancellationToken::new();
        let recognizer = ScriptedRecognizer::new(["noise", "ABC123"])
            .failing_first(2)
            .cancel_on_call(4, cancel.clone());
        let (worker, clipboard, rx) = worker(StaticSource::ok(), recognizer);

        let started = tokio::time::Instant::now();
        let last = worker.run(cancel).await;

        // two failures, one idle cycle, one found cycle; the stop is
        // honored only after the final pause
        assert_eq!(started.elapsed(), Duration::from_secs(5 + 5 + 1 + 3));
        assert_eq!(last, Code::parse("ABC123"));
        assert_eq!(clipboard.writes(), ["ABC123"]);

        let events: Vec<_> = rx.try_iter().collect();
        let cycles: Vec<(u64, Duration)> = events
            .iter()
            .filter_map(|e| match e {
                MonitorEvent::CycleCompleted { cycle, pause } => Some((*cycle, *pause)),
                _ => None,
            })
            .collect();
        assert_eq!(
            cycles,
            [
                (1, Duration::from_secs(5)),
                (2, Duration::from_secs(5)),
                (3, Duration::from_secs(1)),
                (4, Duration::from_secs(3)),
            ]
        );
        assert!(matches!(
            events.last(),
            Some(MonitorEvent::Stopped { cycles: 4, last_code: Some(_) })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_runs_no_cycle() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (worker, _clipboard, rx) =
            worker(StaticSource::ok(), ScriptedRecognizer::new(["ABC123"]));

        let last = worker.with_last_code(Code::parse("OLD111")).run(cancel).await;

        assert_eq!(last, Code::parse("OLD111"));
        assert!(matches!(
            rx.try_iter().last(),
            Some(MonitorEvent::Stopped { cycles: 0, .. })
        ));
    }

    #[test]
    fn abandon_reports_failure_then_stop() {
        let (worker, _clipboard, rx) =
            worker(StaticSource::ok(), ScriptedRecognizer::new(Vec::<&str>::new()));

        assert_eq!(worker.abandon("no runtime".into()), None);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(&events[0], MonitorEvent::Status(Status::Failed { message, .. }) if message == "no runtime"));
        assert!(matches!(events.last(), Some(MonitorEvent::Stopped { cycles: 0, .. })));
    }
}
