// Screen recorder orchestration
//
// Sequences user intent -> capture request -> recording -> artifact ->
// preview/save/discard, the way the recorder view drives the engine. Owns an
// explicitly constructed session manager and the area selector; the elapsed
// ticker is cancelled on pause/stop and unconditionally on drop so it can
// never outlive its session.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::capture::CaptureRequest;
use crate::config::Config;
use crate::notifications::{self, LogNotifier, Notifier};
use crate::selection::{AreaSelector, Point, SelectionOutcome, SelectionRect};
use crate::session::{CapturePlatform, RecordedArtifact, RecordingSessionManager, RecordingStatus, SessionError};

/// Drives one recording workflow end to end.
pub struct RecorderController {
    manager: RecordingSessionManager,
    selector: Mutex<AreaSelector>,
    notifier: Arc<dyn Notifier>,
    config: Config,
    audio_enabled: AtomicBool,
    elapsed_secs: Arc<AtomicU64>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    preview: Mutex<Option<RecordedArtifact>>,
}

impl RecorderController {
    pub fn new(platform: Arc<dyn CapturePlatform>, config: Config) -> Self {
        Self::with_notifier(platform, config, Arc::new(LogNotifier))
    }

    pub fn with_notifier(
        platform: Arc<dyn CapturePlatform>,
        config: Config,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let audio_enabled = AtomicBool::new(config.audio_enabled);
        let manager =
            RecordingSessionManager::with_preferences(platform, config.recorder_preferences());
        Self {
            manager,
            selector: Mutex::new(AreaSelector::new()),
            notifier,
            config,
            audio_enabled,
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            ticker: Mutex::new(None),
            preview: Mutex::new(None),
        }
    }

    pub fn manager(&self) -> &RecordingSessionManager {
        &self.manager
    }

    // ------------------------------------------------------------------
    // Capture mode entry points
    // ------------------------------------------------------------------

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled.load(Ordering::SeqCst)
    }

    pub fn toggle_audio(&self) -> bool {
        let enabled = !self.audio_enabled.load(Ordering::SeqCst);
        self.audio_enabled.store(enabled, Ordering::SeqCst);
        enabled
    }

    /// Record a full monitor.
    pub async fn start_fullscreen(&self) -> Result<(), SessionError> {
        let mut request = CaptureRequest::fullscreen(self.audio_enabled(), self.config.frame_rate);
        request.cursor = self.config.cursor;
        self.start_with_request(request).await
    }

    /// Record a single window.
    pub async fn start_window(&self) -> Result<(), SessionError> {
        let mut request = CaptureRequest::window(self.audio_enabled(), self.config.frame_rate);
        request.cursor = self.config.cursor;
        self.start_with_request(request).await
    }

    // ------------------------------------------------------------------
    // Area selection
    // ------------------------------------------------------------------

    /// Arm the area selector; subsequent pointer events are classified by it.
    pub fn begin_area_selection(&self) {
        self.selector.lock().activate();
    }

    /// Abandon area selection without recording (e.g. the user clicked away).
    pub fn cancel_area_selection(&self) {
        self.selector.lock().deactivate();
    }

    /// Escape pressed during selection.
    pub fn selection_escape(&self) -> Option<SelectionOutcome> {
        self.selector.lock().cancel()
    }

    pub fn pointer_down(&self, point: Point) {
        self.selector.lock().pointer_down(point);
    }

    pub fn pointer_move(&self, point: Point) {
        self.selector.lock().pointer_move(point);
    }

    /// Complete the drag. An accepted rectangle starts a monitor capture
    /// sized by the selection (the rectangle's offset is never applied to the
    /// stream; known limitation of the capture platform).
    pub async fn pointer_up(&self) -> Result<Option<SelectionOutcome>, SessionError> {
        let outcome = self.selector.lock().pointer_up();
        if let Some(SelectionOutcome::Accepted(rect)) = outcome {
            let mut request =
                CaptureRequest::region(self.audio_enabled(), self.config.frame_rate, &rect);
            request.cursor = self.config.cursor;
            self.start_with_request(request).await?;
        }
        Ok(outcome)
    }

    /// The in-progress selection rectangle, for overlay rendering.
    pub fn selection_overlay_rect(&self) -> Option<SelectionRect> {
        self.selector.lock().current_rect()
    }

    // ------------------------------------------------------------------
    // Recording lifecycle
    // ------------------------------------------------------------------

    async fn start_with_request(&self, request: CaptureRequest) -> Result<(), SessionError> {
        let stream = match self.manager.request_capture(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                self.notifier
                    .notify(notifications::recording_failed(&e.to_string()));
                return Err(e);
            }
        };

        if let Err(e) = self.manager.start_recording(stream).await {
            self.notifier
                .notify(notifications::recording_failed(&e.to_string()));
            return Err(e);
        }

        self.elapsed_secs.store(0, Ordering::SeqCst);
        self.start_ticker();
        if self.config.notify_recording_start {
            self.notifier.notify(notifications::recording_started());
        }
        Ok(())
    }

    /// Pause an active recording; halts the elapsed ticker.
    pub fn pause(&self) {
        if self.manager.status() != RecordingStatus::Recording {
            return;
        }
        self.manager.pause_recording();
        self.stop_ticker();
        self.notifier.notify(notifications::recording_paused());
    }

    /// Resume a paused recording; the ticker continues from where it halted.
    pub fn resume(&self) {
        if self.manager.status() != RecordingStatus::Paused {
            return;
        }
        self.manager.resume_recording();
        self.start_ticker();
        self.notifier.notify(notifications::recording_resumed());
    }

    /// Stop the recording and hold the artifact for preview.
    pub async fn stop(&self) -> Result<(), SessionError> {
        match self.manager.stop_recording().await {
            Ok(artifact) => {
                self.stop_ticker();
                self.elapsed_secs.store(0, Ordering::SeqCst);
                if self.config.notify_recording_stop {
                    self.notifier
                        .notify(notifications::recording_completed(artifact.duration_seconds));
                }
                *self.preview.lock() = Some(artifact);
                Ok(())
            }
            Err(e) => {
                self.stop_ticker();
                self.elapsed_secs.store(0, Ordering::SeqCst);
                self.notifier
                    .notify(notifications::recording_failed(&e.to_string()));
                Err(e)
            }
        }
    }

    /// The artifact awaiting save or discard, if any.
    pub fn preview_artifact(&self) -> Option<RecordedArtifact> {
        self.preview.lock().clone()
    }

    /// Write the previewed artifact into the configured storage directory.
    /// Returns `None` when there is nothing to save.
    pub fn save_recording(&self) -> anyhow::Result<Option<PathBuf>> {
        let artifact = match self.preview.lock().take() {
            Some(artifact) => artifact,
            None => return Ok(None),
        };

        let path = artifact.save_to(&self.config.storage_path)?;
        // The preview is gone; its access handle goes with it
        self.manager.blob_urls().revoke(&artifact.access_url);
        self.notifier
            .notify(notifications::recording_saved(&artifact.export_filename()));
        Ok(Some(path))
    }

    /// Drop the previewed artifact and revoke its access handle.
    pub fn discard_recording(&self) {
        if let Some(artifact) = self.preview.lock().take() {
            self.manager.blob_urls().revoke(&artifact.access_url);
            self.notifier.notify(notifications::recording_discarded());
        }
    }

    /// Bump zoom by one step and report the new factor.
    pub fn zoom_in(&self) -> f64 {
        let factor = self.manager.increase_zoom();
        self.notifier.notify(notifications::zoom_changed(factor));
        factor
    }

    // ------------------------------------------------------------------
    // Elapsed timer
    // ------------------------------------------------------------------

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_secs.load(Ordering::SeqCst)
    }

    /// Elapsed recording time as `MM:SS`.
    pub fn elapsed_display(&self) -> String {
        notifications::format_elapsed(self.elapsed_seconds())
    }

    fn start_ticker(&self) {
        let mut ticker = self.ticker.lock();
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
        let elapsed = self.elapsed_secs.clone();
        *ticker = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut interval =
                tokio::time::interval_at(start + Duration::from_secs(1), Duration::from_secs(1));
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for RecorderController {
    fn drop(&mut self) {
        // The ticker must never outlive the view that owns it
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::HeadlessBackend;
    use crate::notifications::Notification;

    #[derive(Default)]
    struct CollectingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().push(notification);
        }
    }

    impl CollectingNotifier {
        fn titles(&self) -> Vec<String> {
            self.seen.lock().iter().map(|n| n.title.clone()).collect()
        }
    }

    fn controller() -> (RecorderController, Arc<CollectingNotifier>) {
        let notifier = Arc::new(CollectingNotifier::default());
        let controller = RecorderController::with_notifier(
            Arc::new(HeadlessBackend::new().with_chunk_bytes(64)),
            Config {
                storage_path: PathBuf::from("."),
                ..Config::default()
            },
            notifier.clone(),
        );
        (controller, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_timer_counts_seconds_while_recording() {
        let (controller, _) = controller();
        controller.start_fullscreen().await.unwrap();
        assert_eq!(controller.elapsed_display(), "00:00");

        tokio::time::sleep(Duration::from_millis(3050)).await;
        assert_eq!(controller.elapsed_display(), "00:03");

        controller.stop().await.unwrap();
        assert_eq!(controller.elapsed_display(), "00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_halts_while_paused_and_continues_on_resume() {
        let (controller, _) = controller();
        controller.start_fullscreen().await.unwrap();

        tokio::time::sleep(Duration::from_millis(2050)).await;
        controller.pause();
        assert_eq!(controller.elapsed_seconds(), 2);

        // Paused time does not advance the display counter
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(controller.elapsed_seconds(), 2);

        controller.resume();
        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(controller.elapsed_display(), "00:03");

        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_area_selection_starts_recording() {
        let (controller, _) = controller();

        controller.begin_area_selection();
        controller.pointer_down(Point::new(100, 100));
        controller.pointer_move(Point::new(250, 260));
        let outcome = controller.pointer_up().await.unwrap();

        assert_eq!(
            outcome,
            Some(SelectionOutcome::Accepted(SelectionRect {
                x: 100,
                y: 100,
                width: 150,
                height: 160,
            }))
        );
        assert_eq!(controller.manager().status(), RecordingStatus::Recording);
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn sub_threshold_selection_cancels_without_recording() {
        let (controller, _) = controller();

        controller.begin_area_selection();
        controller.pointer_down(Point::new(10, 10));
        controller.pointer_move(Point::new(15, 12));
        let outcome = controller.pointer_up().await.unwrap();

        assert_eq!(outcome, Some(SelectionOutcome::Cancelled));
        assert_eq!(controller.manager().status(), RecordingStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn save_writes_file_and_revokes_handle() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(CollectingNotifier::default());
        let controller = RecorderController::with_notifier(
            Arc::new(HeadlessBackend::new().with_chunk_bytes(64)),
            Config {
                storage_path: dir.path().to_path_buf(),
                ..Config::default()
            },
            notifier.clone(),
        );

        controller.start_fullscreen().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1050)).await;
        controller.stop().await.unwrap();

        let path = controller.save_recording().unwrap().expect("artifact saved");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("screen-recording-"));
        assert!(name.ends_with(".webm"));
        assert!(path.exists());

        assert!(controller.preview_artifact().is_none());
        assert_eq!(controller.manager().blob_urls().live_urls(), 0);

        // Nothing left to save
        assert!(controller.save_recording().unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_revokes_the_access_handle() {
        let (controller, notifier) = controller();

        controller.start_fullscreen().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1050)).await;
        controller.stop().await.unwrap();
        assert_eq!(controller.manager().blob_urls().live_urls(), 1);

        controller.discard_recording();
        assert_eq!(controller.manager().blob_urls().live_urls(), 0);
        assert!(controller.preview_artifact().is_none());
        assert!(notifier.titles().contains(&"Recording".to_string()));
    }

    #[tokio::test]
    async fn failure_notifications_carry_the_reason() {
        let notifier = Arc::new(CollectingNotifier::default());
        let controller = RecorderController::with_notifier(
            Arc::new(HeadlessBackend::denying("permission denied by user")),
            Config::default(),
            notifier.clone(),
        );

        let err = controller.start_fullscreen().await.err().expect("must fail");
        assert!(err.to_string().contains("permission denied by user"));

        let seen = notifier.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_error);
        assert!(seen[0].body.contains("permission denied by user"));
    }

    #[tokio::test]
    async fn zoom_in_notifies_with_new_factor() {
        let (controller, notifier) = controller();
        assert_eq!(controller.zoom_in(), 1.5);
        assert_eq!(controller.zoom_in(), 2.0);
        let seen = notifier.seen.lock();
        assert_eq!(seen[0].body, "Zoomed to 1.5x");
        assert_eq!(seen[1].body, "Zoomed to 2x");
    }
}
