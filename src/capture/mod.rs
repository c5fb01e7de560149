// Display capture types and the platform acquisition seam
//
// A `CaptureBackend` hands out live `CaptureStream`s in response to a
// `CaptureRequest`. The request either resolves with a stream or rejects with
// a typed error, exactly once; in-flight requests cannot be cancelled.
// Streams are owned exclusively by the session manager and must be released
// (all tracks stopped) exactly once, on normal stop or on error.

pub mod headless;

pub use headless::HeadlessBackend;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::selection::SelectionRect;

/// Error type for capture acquisition
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    /// The platform (or the user) declined the capture request.
    #[error("screen capture permission denied: {0}")]
    PermissionDenied(String),

    /// No source matching the request exists, or capture is not supported.
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),
}

/// Category of content being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// A single browser tab
    Browser,
    /// A single application window
    Window,
    /// A full monitor
    Monitor,
}

/// How the pointer cursor appears in the captured video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorPolicy {
    Always,
    Never,
    /// Only while the pointer is moving
    Motion,
}

impl Default for CursorPolicy {
    fn default() -> Self {
        Self::Always
    }
}

/// Parameters for a capture acquisition. Immutable once passed to the
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Whether to also capture system audio
    pub audio: bool,
    pub surface: SurfaceKind,
    /// Requested video width in pixels, if constrained
    pub width: Option<u32>,
    /// Requested video height in pixels, if constrained
    pub height: Option<u32>,
    pub frame_rate: Option<u32>,
    pub cursor: CursorPolicy,
}

impl CaptureRequest {
    /// Capture a full monitor.
    pub fn fullscreen(audio: bool, frame_rate: u32) -> Self {
        Self {
            audio,
            surface: SurfaceKind::Monitor,
            width: None,
            height: None,
            frame_rate: Some(frame_rate),
            cursor: CursorPolicy::Always,
        }
    }

    /// Capture a single window.
    pub fn window(audio: bool, frame_rate: u32) -> Self {
        Self {
            audio,
            surface: SurfaceKind::Window,
            width: None,
            height: None,
            frame_rate: Some(frame_rate),
            cursor: CursorPolicy::Always,
        }
    }

    /// Capture derived from an accepted area selection.
    ///
    /// Known limitation: the rectangle only sizes the request. The platform
    /// call still captures the full monitor, and the rectangle's offset is
    /// never applied to the resulting stream.
    pub fn region(audio: bool, frame_rate: u32, rect: &SelectionRect) -> Self {
        Self {
            audio,
            surface: SurfaceKind::Monitor,
            width: Some(rect.width),
            height: Some(rect.height),
            frame_rate: Some(frame_rate),
            cursor: CursorPolicy::Always,
        }
    }
}

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// One live media track inside a capture stream.
#[derive(Debug)]
pub struct CaptureTrack {
    pub kind: TrackKind,
    pub label: String,
    stopped: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl CaptureTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            stopped: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Stop the underlying source. Idempotent.
    pub fn stop(&self) {
        self.stopped
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Shared handle to this track's stopped flag, for backends that need to
    /// observe release from the outside.
    pub(crate) fn stopped_flag(&self) -> std::sync::Arc<std::sync::atomic::AtomicBool> {
        self.stopped.clone()
    }
}

/// A live audio/video source obtained from the platform.
///
/// Owned exclusively by the session manager for the duration of a session.
/// `release` stops every track; releasing twice is a no-op. Dropping an
/// unreleased stream releases it as a backstop so a failed start can never
/// leak a live capture device.
#[derive(Debug)]
pub struct CaptureStream {
    id: Uuid,
    tracks: Vec<CaptureTrack>,
    released: bool,
}

impl CaptureStream {
    pub fn new(tracks: Vec<CaptureTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
            released: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[CaptureTrack] {
        &self.tracks
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Audio)
    }

    /// Stop every underlying track. Exactly-once; later calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for track in &self.tracks {
            track.stop();
        }
        self.released = true;
        log::debug!("capture stream {} released ({} tracks)", self.id, self.tracks.len());
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("capture stream {} dropped without release, stopping tracks", self.id);
            self.release();
        }
    }
}

/// Pending resolution of a capture request: resolves exactly once with a
/// stream or a typed failure.
pub type PendingCapture = oneshot::Receiver<Result<CaptureStream, CaptureError>>;

/// Platform seam for acquiring display capture sources.
pub trait CaptureBackend: Send + Sync {
    /// Ask the platform for a live capture source matching `request`.
    /// Suspends the caller (via the returned receiver) until the platform
    /// grants or denies access.
    fn request_capture(&self, request: &CaptureRequest) -> PendingCapture;
}
