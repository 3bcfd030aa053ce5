//! Foreground side of the monitor: state transitions and the poller's
//! lifecycle.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::DynamicImage;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::state::{MonitorEvent, MonitorState, Status};
use super::worker::{MonitorWorker, Waker};
use crate::capture::ScreenSource;
use crate::clipboard::ClipboardSink;
use crate::config::{Config, PollTimings};
use crate::error::{AppError, Result};
use crate::extract::Code;
use crate::ocr::Recognizer;
use crate::region::Rectangle;

/// Owns the [`MonitorState`] and at most one background poller.
///
/// The poller publishes [`MonitorEvent`]s; [`poll_events`](Self::poll_events)
/// and [`wait_event`](Self::wait_event) apply them to this read-only mirror.
pub struct MonitorController<S: ?Sized, R: ?Sized, C: ?Sized> {
    source: Arc<S>,
    recognizer: Arc<R>,
    clipboard: Arc<C>,
    timings: PollTimings,
    preview_max: (u32, u32),
    waker: Option<Waker>,

    state: MonitorState,
    state_before_selection: MonitorState,
    region: Option<Rectangle>,
    last_code: Option<Code>,
    status: Status,
    preview: Option<DynamicImage>,
    cycles: u64,

    events_tx: Sender<MonitorEvent>,
    events_rx: Receiver<MonitorEvent>,
    cancel: Option<CancellationToken>,
    worker: Option<JoinHandle<()>>,
}

impl<S, R, C> MonitorController<S, R, C>
where
    S: ScreenSource + ?Sized + 'static,
    R: Recognizer + ?Sized + 'static,
    C: ClipboardSink + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, recognizer: Arc<R>, clipboard: Arc<C>, config: &Config) -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            source,
            recognizer,
            clipboard,
            timings: config.timings,
            preview_max: config.preview_max,
            waker: None,
            state: MonitorState::Idle,
            state_before_selection: MonitorState::Idle,
            region: None,
            last_code: None,
            status: Status::Ready,
            preview: None,
            cycles: 0,
            events_tx,
            events_rx,
            cancel: None,
            worker: None,
        }
    }

    /// Registers a callback run whenever the poller publishes an event.
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn region(&self) -> Option<Rectangle> {
        self.region
    }

    pub fn last_code(&self) -> Option<&Code> {
        self.last_code.as_ref()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn preview(&self) -> Option<&DynamicImage> {
        self.preview.as_ref()
    }

    /// Cycles attempted by the current (or most recent) poller.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn timings(&self) -> PollTimings {
        self.timings
    }

    /// Changes the pauses used from the next start on.
    pub fn set_timings(&mut self, timings: PollTimings) {
        self.timings = timings;
    }

    /// Replaces the OCR engine; not allowed while a poller uses it.
    pub fn set_recognizer(&mut self, recognizer: Arc<R>) -> Result<()> {
        if self.state == MonitorState::Monitoring {
            return Err(self.invalid("change the recognizer"));
        }
        self.recognizer = recognizer;
        Ok(())
    }

    /// A stop was requested but the poller has not exited yet.
    pub fn is_stopping(&self) -> bool {
        self.state == MonitorState::Monitoring
            && self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    pub fn can_start(&self) -> bool {
        self.state == MonitorState::Selected
    }

    pub fn can_stop(&self) -> bool {
        self.state == MonitorState::Monitoring && !self.is_stopping()
    }

    pub fn can_select(&self) -> bool {
        matches!(self.state, MonitorState::Idle | MonitorState::Selected)
    }

    /// Enters `Selecting`; the previous state is restored if the selection
    /// is dismissed.
    pub fn begin_selection(&mut self) -> Result<()> {
        if !self.can_select() {
            return Err(self.invalid("select a region"));
        }
        self.state_before_selection = self.state;
        self.state = MonitorState::Selecting;
        Ok(())
    }

    /// Finishes a selection started with [`begin_selection`](Self::begin_selection).
    ///
    /// # Errors
    ///
    /// - [`AppError::NoRegion`] when the overlay was dismissed (`None`)
    /// - [`AppError::EmptySelection`] for a rectangle without area
    ///
    /// In both cases the state and region from before the selection remain.
    pub fn commit_selection(&mut self, selection: Option<Rectangle>) -> Result<Rectangle> {
        if self.state != MonitorState::Selecting {
            return Err(self.invalid("commit a selection"));
        }
        self.state = self.state_before_selection;

        match selection {
            None => {
                info!("Selection dismissed");
                self.status = Status::NoRegion;
                Err(AppError::NoRegion)
            }
            Some(rect) if rect.is_empty() => {
                info!("Selection {} has no area", rect);
                self.status = Status::EmptyRegion;
                Err(AppError::EmptySelection)
            }
            Some(rect) => {
                info!("Selected region {}", rect);
                self.region = Some(rect);
                self.state = MonitorState::Selected;
                self.status = Status::RegionSelected(rect);
                Ok(rect)
            }
        }
    }

    /// Selects a known rectangle without an interactive overlay.
    pub fn select_region(&mut self, rect: Rectangle) -> Result<Rectangle> {
        self.begin_selection()?;
        self.commit_selection(Some(rect))
    }

    /// Spawns the poller for the selected region.
    ///
    /// Only allowed in `Selected`; while a poller runs (even one that is
    /// stopping) the state is `Monitoring`, so a second one is never started.
    pub fn start(&mut self) -> Result<()> {
        let region = match (self.state, self.region) {
            (MonitorState::Selected, Some(region)) => region,
            _ => return Err(self.invalid("start monitoring")),
        };

        let worker = MonitorWorker::new(
            self.source.clone(),
            self.recognizer.clone(),
            self.clipboard.clone(),
            region,
            self.timings,
            self.preview_max,
            self.events_tx.clone(),
        )
        .with_last_code(self.last_code.clone())
        .with_waker(self.waker.clone());

        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        // Spawn background thread hosting a single-threaded runtime
        let handle = thread::Builder::new()
            .name("codeclip-monitor".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build();

                match runtime {
                    Ok(rt) => {
                        rt.block_on(worker.run(worker_cancel));
                    }
                    Err(e) => {
                        error!("Failed to create async runtime: {}", e);
                        worker.abandon(format!("Failed to create async runtime: {}", e));
                    }
                }
            })?;

        self.cancel = Some(cancel);
        self.worker = Some(handle);
        self.cycles = 0;
        self.state = MonitorState::Monitoring;
        self.status = Status::Started(region);
        Ok(())
    }

    /// Asks the poller to stop after its current pause.
    ///
    /// The state becomes `Selected` once the poller reports that it exited.
    pub fn stop(&mut self) -> Result<()> {
        if !self.can_stop() {
            return Err(self.invalid("stop monitoring"));
        }
        if let Some(cancel) = &self.cancel {
            info!("Stop requested");
            cancel.cancel();
        }
        Ok(())
    }

    /// Stops any poller without waiting and enters the final `Stopped` state.
    pub fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        // The thread finishes its pause on its own; nothing waits for it
        self.worker = None;
        self.state = MonitorState::Stopped;
        self.status = Status::Stopped {
            last_code: self.last_code.clone(),
        };
    }

    /// Applies every pending poller event and returns them.
    pub fn poll_events(&mut self) -> Vec<MonitorEvent> {
        let events: Vec<_> = self.events_rx.try_iter().collect();
        for event in &events {
            self.apply(event);
        }
        events
    }

    /// Waits up to `timeout` for the next poller event and applies it.
    pub fn wait_event(&mut self, timeout: Duration) -> Option<MonitorEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(&event);
                Some(event)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn apply(&mut self, event: &MonitorEvent) {
        if self.state == MonitorState::Stopped {
            return;
        }

        match event {
            MonitorEvent::Preview(image) => self.preview = Some(image.clone()),
            MonitorEvent::Status(status) => self.status = status.clone(),
            MonitorEvent::CodeFound(code) => self.last_code = Some(code.clone()),
            MonitorEvent::CycleCompleted { cycle, .. } => self.cycles = *cycle,
            MonitorEvent::Stopped { last_code, cycles } => {
                self.last_code = last_code.clone();
                self.cycles = *cycles;
                self.cancel = None;
                if let Some(handle) = self.worker.take() {
                    if handle.join().is_err() {
                        warn!("Monitor thread panicked");
                    }
                }
                self.state = MonitorState::Selected;
            }
        }
    }

    fn invalid(&self, action: &'static str) -> AppError {
        AppError::InvalidTransition {
            from: self.state.label(),
            action,
        }
    }
}

impl<S: ?Sized, R: ?Sized, C: ?Sized> Drop for MonitorController<S, R, C> {
    fn drop(&mut self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::testing::{RecordingClipboard, ScriptedRecognizer, StaticSource};
    use std::time::Instant;

    type TestController = MonitorController<StaticSource, ScriptedRecognizer, RecordingClipboard>;

    fn controller(texts: &[&str]) -> (TestController, Arc<StaticSource>, Arc<RecordingClipboard>) {
        let config = Config::builder()
            .with_timings(PollTimings {
                found: Duration::from_millis(5),
                idle: Duration::from_millis(2),
                failure: Duration::from_millis(10),
            })
            .build()
            .unwrap();
        let source = Arc::new(StaticSource::ok());
        let clipboard = Arc::new(RecordingClipboard::default());
        let controller = MonitorController::new(
            source.clone(),
            Arc::new(ScriptedRecognizer::new(texts.iter().copied())),
            clipboard.clone(),
            &config,
        );
        (controller, source, clipboard)
    }

    fn wait_until(controller: &mut TestController, done: impl Fn(&TestController) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(controller) {
            assert!(Instant::now() < deadline, "timed out in state {:?}", controller.state());
            controller.wait_event(Duration::from_millis(20));
        }
    }

    #[test]
    fn start_requires_a_region() {
        let (mut controller, _, _) = controller(&["ABC123"]);
        let err = controller.start().unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { action: "start monitoring", .. }));
        assert_eq!(controller.state(), MonitorState::Idle);
    }

    #[test]
    fn dismissed_selection_reports_no_region() {
        let (mut controller, _, _) = controller(&[]);

        controller.begin_selection().unwrap();
        assert_eq!(controller.state(), MonitorState::Selecting);

        let err = controller.commit_selection(None).unwrap_err();
        assert!(matches!(err, AppError::NoRegion));
        assert_eq!(controller.state(), MonitorState::Idle);
        assert_eq!(controller.status(), &Status::NoRegion);
        assert_eq!(controller.region(), None);
    }

    #[test]
    fn dismissing_a_reselection_keeps_the_old_region() {
        let (mut controller, _, _) = controller(&[]);
        let rect = Rectangle::new(0, 0, 10, 10);
        controller.select_region(rect).unwrap();

        controller.begin_selection().unwrap();
        assert!(controller.commit_selection(None).is_err());
        assert_eq!(controller.state(), MonitorState::Selected);
        assert_eq!(controller.region(), Some(rect));
        assert!(controller.can_start());
    }

    #[test]
    fn empty_rectangle_is_rejected() {
        let (mut controller, _, _) = controller(&[]);
        let err = controller.select_region(Rectangle::new(5, 5, 5, 40)).unwrap_err();
        assert!(matches!(err, AppError::EmptySelection));
        assert_eq!(controller.state(), MonitorState::Idle);
    }

    #[test]
    fn stop_returns_to_selected_and_keeps_region() {
        let (mut controller, source, clipboard) = controller(&["nothing yet", "ABC123"]);
        let rect = Rectangle::new(10, 20, 50, 80);
        controller.select_region(rect).unwrap();

        controller.start().unwrap();
        assert_eq!(controller.state(), MonitorState::Monitoring);
        assert!(!controller.can_select());

        wait_until(&mut controller, |c| c.last_code().is_some());
        controller.stop().unwrap();
        assert!(controller.is_stopping());
        assert!(controller.stop().is_err());

        wait_until(&mut controller, |c| c.state() == MonitorState::Selected);
        assert_eq!(controller.region(), Some(rect));
        assert_eq!(controller.last_code().map(Code::as_str), Some("ABC123"));
        assert_eq!(
            controller.status(),
            &Status::Stopped { last_code: Code::parse("ABC123") }
        );
        assert!(controller.cycles() >= 2);
        assert_eq!(source.captures() as u64, controller.cycles());
        assert_eq!(clipboard.writes().first().map(String::as_str), Some("ABC123"));

        // the region survives for another run
        controller.start().unwrap();
        controller.stop().unwrap();
        wait_until(&mut controller, |c| c.state() == MonitorState::Selected);
        assert_eq!(controller.last_code().map(Code::as_str), Some("ABC123"));
    }

    #[test]
    fn clipboard_is_shared_across_runs_and_kept_after_stop() {
        let (mut controller, _, clipboard) = controller(&["ABC123", "noise", "XYZ789"]);
        controller.select_region(Rectangle::new(0, 0, 8, 8)).unwrap();

        controller.start().unwrap();
        wait_until(&mut controller, |c| c.last_code().is_some());
        controller.stop().unwrap();
        wait_until(&mut controller, |c| c.state() == MonitorState::Selected);

        // the finished poller released its handle; the controller still owns one
        assert_eq!(Arc::strong_count(&clipboard), 2);

        controller.start().unwrap();
        wait_until(&mut controller, |c| c.last_code().map(Code::as_str) == Some("XYZ789"));
        controller.stop().unwrap();
        wait_until(&mut controller, |c| c.state() == MonitorState::Selected);

        let writes = clipboard.writes();
        assert_eq!(writes.first().map(String::as_str), Some("ABC123"));
        assert_eq!(writes.last().map(String::as_str), Some("XYZ789"));
    }

    #[test]
    fn never_runs_two_pollers() {
        let (mut controller, _, _) = controller(&["ABC123"]);
        controller.select_region(Rectangle::new(0, 0, 8, 8)).unwrap();

        controller.start().unwrap();
        assert!(controller.start().is_err());

        controller.stop().unwrap();
        // still stopping: the old poller has not reported its exit yet
        assert!(controller.is_stopping());
        assert!(controller.start().is_err());

        wait_until(&mut controller, |c| c.state() == MonitorState::Selected);
        assert!(controller.can_start());
    }

    #[test]
    fn stop_without_monitoring_is_rejected() {
        let (mut controller, _, _) = controller(&[]);
        assert!(controller.stop().is_err());
        controller.select_region(Rectangle::new(0, 0, 8, 8)).unwrap();
        assert!(controller.stop().is_err());
    }

    #[test]
    fn shutdown_is_final() {
        let (mut controller, _, _) = controller(&["ABC123"]);
        controller.select_region(Rectangle::new(0, 0, 8, 8)).unwrap();
        controller.start().unwrap();

        controller.shutdown();
        assert_eq!(controller.state(), MonitorState::Stopped);
        assert!(controller.start().is_err());
        assert!(controller.begin_selection().is_err());

        controller.wait_event(Duration::from_millis(50));
        assert_eq!(controller.state(), MonitorState::Stopped);
    }
}
