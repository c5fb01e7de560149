// Recording session lifecycle
//
// One manager owns at most one active capture stream and recorder at a time.
// Starting a new session implicitly stops the previous one. Every exit path,
// including failed encoder creation, releases the stream so a live capture
// device is never leaked.

pub mod artifact;

pub use artifact::{BlobUrlRegistry, RecordedArtifact};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::capture::{CaptureBackend, CaptureError, CaptureRequest, CaptureStream};
use crate::encoding::{ChunkReceiver, MediaRecorder, RecorderFactory, RecorderPreferences};

/// Zoom factor bounds and step. Zoom is carried as session state for the UI
/// but has no effect on the actual capture; known limitation.
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_STEP: f64 = 0.5;

/// Everything the manager needs from the platform: capture acquisition plus
/// recorder construction.
pub trait CapturePlatform: CaptureBackend + RecorderFactory {}

impl<T: CaptureBackend + RecorderFactory> CapturePlatform for T {}

/// Error type for session operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Encoder(#[from] crate::encoding::EncodingError),

    /// Stop was called with no session active. A caller bug, reported rather
    /// than swallowed.
    #[error("no recording in progress")]
    NoActiveSession,
}

/// Current recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    /// Ready to record
    Idle,
    /// Currently recording
    Recording,
    /// Recording suspended, resumable
    Paused,
}

/// Serializable snapshot of the session for UI polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub status: RecordingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub has_audio: bool,
    pub zoom_factor: f64,
}

struct ActiveSession {
    stream: CaptureStream,
    recorder: Box<dyn MediaRecorder>,
    chunks: ChunkReceiver,
    started_at: DateTime<Utc>,
    started_instant: Instant,
    paused: bool,
}

/// Owns the lifecycle of one capture stream and one recorder instance.
///
/// Explicitly constructed and owned by the orchestrating view; not a process
/// global. At most one session is active at a time.
pub struct RecordingSessionManager {
    platform: Arc<dyn CapturePlatform>,
    prefs: RecorderPreferences,
    registry: Arc<BlobUrlRegistry>,
    active: Mutex<Option<ActiveSession>>,
    zoom: Mutex<f64>,
}

impl RecordingSessionManager {
    pub fn new(platform: Arc<dyn CapturePlatform>) -> Self {
        Self::with_preferences(platform, RecorderPreferences::default())
    }

    pub fn with_preferences(platform: Arc<dyn CapturePlatform>, prefs: RecorderPreferences) -> Self {
        Self {
            platform,
            prefs,
            registry: Arc::new(BlobUrlRegistry::new()),
            active: Mutex::new(None),
            zoom: Mutex::new(MIN_ZOOM),
        }
    }

    /// Registry holding access URLs for artifacts produced by this manager.
    pub fn blob_urls(&self) -> Arc<BlobUrlRegistry> {
        self.registry.clone()
    }

    pub fn status(&self) -> RecordingStatus {
        match self.active.lock().as_ref() {
            None => RecordingStatus::Idle,
            Some(s) if s.paused => RecordingStatus::Paused,
            Some(_) => RecordingStatus::Recording,
        }
    }

    /// Snapshot for UI polling.
    pub fn state(&self) -> SessionState {
        let active = self.active.lock();
        SessionState {
            status: match active.as_ref() {
                None => RecordingStatus::Idle,
                Some(s) if s.paused => RecordingStatus::Paused,
                Some(_) => RecordingStatus::Recording,
            },
            started_at: active.as_ref().map(|s| s.started_at),
            has_audio: active.as_ref().map(|s| s.stream.has_audio()).unwrap_or(false),
            zoom_factor: *self.zoom.lock(),
        }
    }

    /// Ask the platform for a live capture source matching `request`.
    /// Suspends until the platform grants or denies access; the failure
    /// carries the platform's human-readable reason.
    pub async fn request_capture(
        &self,
        request: &CaptureRequest,
    ) -> Result<CaptureStream, SessionError> {
        let pending = self.platform.request_capture(request);
        let result = pending.await.map_err(|_| {
            CaptureError::Unavailable("capture request dropped without a response".to_string())
        })?;
        Ok(result?)
    }

    /// Begin recording `stream`. If a session is already active it is
    /// implicitly stopped first and its artifact discarded, so there is never
    /// more than one concurrent recorder.
    pub async fn start_recording(&self, mut stream: CaptureStream) -> Result<(), SessionError> {
        if self.active.lock().is_some() {
            log::warn!("start_recording while a session is active; stopping the previous session");
            match self.stop_recording().await {
                Ok(discarded) => {
                    self.registry.revoke(&discarded.access_url);
                    log::info!(
                        "discarded implicitly-stopped recording ({:.1}s)",
                        discarded.duration_seconds
                    );
                }
                Err(e) => log::warn!("implicit stop failed: {}", e),
            }
        }

        let (mut recorder, chunks) = match self.platform.create_recorder(&stream, &self.prefs) {
            Ok(pair) => pair,
            Err(e) => {
                stream.release();
                return Err(e.into());
            }
        };
        if let Err(e) = recorder.start() {
            stream.release();
            return Err(e.into());
        }

        let started_at = Utc::now();
        *self.active.lock() = Some(ActiveSession {
            stream,
            recorder,
            chunks,
            started_at,
            started_instant: Instant::now(),
            paused: false,
        });
        log::info!("recording started at {}", started_at);
        Ok(())
    }

    /// Suspend an active recording. No-op unless currently Recording.
    pub fn pause_recording(&self) {
        let mut active = self.active.lock();
        match active.as_mut() {
            Some(s) if !s.paused => {
                s.recorder.pause();
                s.paused = true;
                log::info!("recording paused");
            }
            _ => log::debug!("pause_recording ignored: not recording"),
        }
    }

    /// Resume a paused recording. No-op unless currently Paused.
    pub fn resume_recording(&self) {
        let mut active = self.active.lock();
        match active.as_mut() {
            Some(s) if s.paused => {
                s.recorder.resume();
                s.paused = false;
                log::info!("recording resumed");
            }
            _ => log::debug!("resume_recording ignored: not paused"),
        }
    }

    /// Stop the active recording and assemble the artifact.
    ///
    /// Waits for the recorder to flush its final chunk, concatenates the
    /// chunk sequence in arrival order, releases the stream, and transitions
    /// to Idle. Duration is wall-clock elapsed since start, paused time
    /// included (observed behavior of the original design).
    pub async fn stop_recording(&self) -> Result<RecordedArtifact, SessionError> {
        let mut session = self
            .active
            .lock()
            .take()
            .ok_or(SessionError::NoActiveSession)?;

        let duration_seconds = session.started_instant.elapsed().as_secs_f64();
        session.recorder.stop();

        // Drain until the recorder drops its sender: the terminal flush signal
        let mut data = Vec::new();
        let mut chunk_count = 0usize;
        while let Some(chunk) = session.chunks.recv().await {
            data.extend_from_slice(&chunk.data);
            chunk_count += 1;
        }
        session.stream.release();

        let data = Arc::new(data);
        let access_url = self.registry.create_url(data.clone());
        log::info!(
            "recording stopped: {:.1}s, {} chunks, {} bytes",
            duration_seconds,
            chunk_count,
            data.len()
        );

        Ok(RecordedArtifact {
            data,
            access_url,
            created_at: session.started_at,
            duration_seconds,
        })
    }

    /// Current zoom factor in [1.0, 5.0].
    pub fn zoom_factor(&self) -> f64 {
        *self.zoom.lock()
    }

    /// Set the zoom factor, clamped to [1.0, 5.0]. Display-only state; does
    /// not alter the capture.
    pub fn set_zoom_factor(&self, factor: f64) {
        *self.zoom.lock() = factor.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Bump zoom by one step, clamped. Returns the new factor so the caller
    /// can render it.
    pub fn increase_zoom(&self) -> f64 {
        let mut zoom = self.zoom.lock();
        *zoom = (*zoom + ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        *zoom
    }
}
