// Headless capture backend
//
// Deterministic in-process implementation of the platform seams, used by the
// scenario runner and the test suite, and as the default backend on hosts
// with no display capture support. Grants (or scriptedly denies) capture
// requests synchronously and synthesizes encoded chunks on a tokio interval
// at the configured time slice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::capture::{
    CaptureBackend, CaptureError, CaptureRequest, CaptureStream, CaptureTrack, PendingCapture,
    TrackKind,
};
use crate::encoding::{
    ChunkReceiver, ChunkSender, EncodedChunk, EncodingError, MediaRecorder, RecorderFactory,
    RecorderPreferences,
};

/// Scripted response to capture requests.
#[derive(Debug, Clone)]
pub enum PermissionPolicy {
    /// Grant every request.
    Grant,
    /// Decline every request with this reason.
    Deny(String),
    /// Report that no matching source exists.
    Unavailable(String),
}

/// Synthetic bytes per one-timeslice chunk.
const DEFAULT_CHUNK_BYTES: usize = 4096;

struct IssuedStream {
    track_flags: Vec<Arc<AtomicBool>>,
}

/// In-process capture platform with scripted behavior.
pub struct HeadlessBackend {
    permission: PermissionPolicy,
    encoder_available: bool,
    chunk_bytes: usize,
    issued: Mutex<Vec<IssuedStream>>,
}

impl HeadlessBackend {
    /// Backend that grants every request and encodes successfully.
    pub fn new() -> Self {
        Self {
            permission: PermissionPolicy::Grant,
            encoder_available: true,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Backend that declines every capture request.
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            permission: PermissionPolicy::Deny(reason.into()),
            ..Self::new()
        }
    }

    /// Backend with no matching capture source.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            permission: PermissionPolicy::Unavailable(reason.into()),
            ..Self::new()
        }
    }

    /// Backend whose recorder creation always fails.
    pub fn without_encoder() -> Self {
        Self {
            encoder_available: false,
            ..Self::new()
        }
    }

    pub fn with_chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = bytes;
        self
    }

    /// Number of streams this backend has handed out.
    pub fn issued_streams(&self) -> usize {
        self.issued.lock().len()
    }

    /// True when every track of every issued stream has been stopped.
    /// The release-bookkeeping check used by scenario validators.
    pub fn all_tracks_stopped(&self) -> bool {
        self.issued
            .lock()
            .iter()
            .flat_map(|s| s.track_flags.iter())
            .all(|flag| flag.load(Ordering::SeqCst))
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for HeadlessBackend {
    fn request_capture(&self, request: &CaptureRequest) -> PendingCapture {
        let (tx, rx) = tokio::sync::oneshot::channel();

        let result = match &self.permission {
            PermissionPolicy::Deny(reason) => Err(CaptureError::PermissionDenied(reason.clone())),
            PermissionPolicy::Unavailable(reason) => {
                Err(CaptureError::Unavailable(reason.clone()))
            }
            PermissionPolicy::Grant => {
                let mut tracks = vec![CaptureTrack::new(TrackKind::Video, "virtual display")];
                if request.audio {
                    tracks.push(CaptureTrack::new(TrackKind::Audio, "virtual audio"));
                }
                let stream = CaptureStream::new(tracks);
                self.issued.lock().push(IssuedStream {
                    track_flags: stream
                        .tracks()
                        .iter()
                        .map(|t| t.stopped_flag())
                        .collect(),
                });
                log::debug!(
                    "headless capture granted: stream {} surface={:?} audio={}",
                    stream.id(),
                    request.surface,
                    request.audio
                );
                Ok(stream)
            }
        };

        if let Err(ref e) = result {
            log::info!("headless capture request rejected: {}", e);
        }
        // The receiver observes exactly one resolution
        let _ = tx.send(result);
        rx
    }
}

impl RecorderFactory for HeadlessBackend {
    fn create_recorder(
        &self,
        stream: &CaptureStream,
        prefs: &RecorderPreferences,
    ) -> Result<(Box<dyn MediaRecorder>, ChunkReceiver), EncodingError> {
        if !self.encoder_available {
            return Err(EncodingError::EncoderInit(format!(
                "no encoder for '{}' on this host",
                prefs.mime_type
            )));
        }

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let recorder = HeadlessRecorder::new(stream.id(), prefs.timeslice, self.chunk_bytes, chunk_tx);
        Ok((Box::new(recorder), chunk_rx))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Running,
    Paused,
    Stopped,
}

/// Synthetic recorder: one deterministic chunk per elapsed time slice while
/// running, none while paused, and a final flush chunk on stop. Dropping the
/// chunk sender is the terminal flush signal.
struct HeadlessRecorder {
    stream_id: Uuid,
    timeslice: Duration,
    chunk_bytes: usize,
    control_tx: watch::Sender<Control>,
    // Handed to the pump task on start; dropped on stop if never started
    chunk_tx: Option<ChunkSender>,
    started: bool,
}

impl HeadlessRecorder {
    fn new(
        stream_id: Uuid,
        timeslice: Duration,
        chunk_bytes: usize,
        chunk_tx: ChunkSender,
    ) -> Self {
        let (control_tx, _) = watch::channel(Control::Running);
        Self {
            stream_id,
            timeslice,
            chunk_bytes,
            control_tx,
            chunk_tx: Some(chunk_tx),
            started: false,
        }
    }
}

impl MediaRecorder for HeadlessRecorder {
    fn start(&mut self) -> Result<(), EncodingError> {
        let chunk_tx = match self.chunk_tx.take() {
            Some(tx) => tx,
            None => {
                return Err(EncodingError::EncoderInit(
                    "recorder already started".to_string(),
                ))
            }
        };
        self.started = true;

        let mut control_rx = self.control_tx.subscribe();
        let timeslice = self.timeslice;
        let chunk_bytes = self.chunk_bytes;
        let stream_id = self.stream_id;

        tokio::spawn(async move {
            let mut sequence: u64 = 0;
            let start = tokio::time::Instant::now();
            let mut interval = tokio::time::interval_at(start + timeslice, timeslice);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if *control_rx.borrow() == Control::Running {
                            let chunk = EncodedChunk {
                                data: vec![sequence as u8; chunk_bytes],
                                sequence,
                            };
                            sequence += 1;
                            if chunk_tx.send(chunk).is_err() {
                                // Consumer gone; nothing left to flush
                                return;
                            }
                        }
                    }
                    changed = control_rx.changed() => {
                        let stopped = changed.is_err()
                            || *control_rx.borrow() == Control::Stopped;
                        if stopped {
                            break;
                        }
                    }
                }
            }

            // Final flush: whatever the encoder still buffered
            let _ = chunk_tx.send(EncodedChunk {
                data: vec![0xEE; chunk_bytes / 4],
                sequence,
            });
            log::debug!(
                "headless recorder for stream {} flushed after {} full slices",
                stream_id,
                sequence
            );
            // chunk_tx drops here, closing the channel
        });

        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.control_tx.send(Control::Paused);
    }

    fn resume(&mut self) {
        let _ = self.control_tx.send(Control::Running);
    }

    fn stop(&mut self) {
        if !self.started {
            // Never started: just close the channel so drains complete
            self.chunk_tx = None;
            return;
        }
        let _ = self.control_tx.send(Control::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SurfaceKind;

    #[tokio::test]
    async fn grant_issues_tracks_matching_request() {
        let backend = HeadlessBackend::new();
        let request = CaptureRequest::fullscreen(true, 30);
        let stream = backend
            .request_capture(&request)
            .await
            .expect("request resolved")
            .expect("granted");
        assert_eq!(stream.tracks().len(), 2);
        assert!(stream.has_audio());
        assert_eq!(backend.issued_streams(), 1);
        assert!(!backend.all_tracks_stopped());
    }

    #[tokio::test]
    async fn deny_carries_reason() {
        let backend = HeadlessBackend::denying("user dismissed the picker");
        let request = CaptureRequest::window(false, 30);
        let err = backend
            .request_capture(&request)
            .await
            .expect("request resolved")
            .expect_err("denied");
        assert!(matches!(err, CaptureError::PermissionDenied(_)));
        assert!(err.to_string().contains("user dismissed the picker"));
        assert_eq!(backend.issued_streams(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recorder_emits_one_chunk_per_slice_and_flushes_on_stop() {
        let backend = HeadlessBackend::new().with_chunk_bytes(64);
        let request = CaptureRequest {
            audio: false,
            surface: SurfaceKind::Monitor,
            width: None,
            height: None,
            frame_rate: Some(30),
            cursor: Default::default(),
        };
        let stream = backend.request_capture(&request).await.unwrap().unwrap();
        let (mut recorder, mut rx) = backend
            .create_recorder(&stream, &RecorderPreferences::default())
            .unwrap();

        recorder.start().unwrap();
        tokio::time::sleep(Duration::from_millis(3100)).await;
        recorder.stop();

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        // 3 full slices plus the final flush
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].sequence, 0);
        assert_eq!(chunks[2].sequence, 2);
        assert_eq!(chunks[0].data.len(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_recorder_skips_slices() {
        let backend = HeadlessBackend::new().with_chunk_bytes(64);
        let stream = backend
            .request_capture(&CaptureRequest::fullscreen(false, 30))
            .await
            .unwrap()
            .unwrap();
        let (mut recorder, mut rx) = backend
            .create_recorder(&stream, &RecorderPreferences::default())
            .unwrap();

        recorder.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        recorder.pause();
        tokio::time::sleep(Duration::from_secs(5)).await;
        recorder.resume();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        recorder.stop();

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        // One slice before the pause, one after, plus the flush
        assert_eq!(chunks.len(), 3);
    }

    #[tokio::test]
    async fn encoder_failure_is_typed() {
        let backend = HeadlessBackend::without_encoder();
        let stream = backend
            .request_capture(&CaptureRequest::fullscreen(false, 30))
            .await
            .unwrap()
            .unwrap();
        let err = backend
            .create_recorder(&stream, &RecorderPreferences::default())
            .err()
            .expect("encoder init fails");
        assert!(matches!(err, EncodingError::EncoderInit(_)));
    }

    #[tokio::test]
    async fn stop_without_start_closes_channel() {
        let backend = HeadlessBackend::new();
        let stream = backend
            .request_capture(&CaptureRequest::fullscreen(false, 30))
            .await
            .unwrap()
            .unwrap();
        let (mut recorder, mut rx) = backend
            .create_recorder(&stream, &RecorderPreferences::default())
            .unwrap();
        recorder.stop();
        assert!(rx.recv().await.is_none());
    }
}
