// Media recorder seam and encoded chunk types
//
// A `RecorderFactory` builds a platform recorder for a capture stream. The
// recorder delivers encoded data in fixed-size time slices as sends on an
// unbounded channel (the data-available notification); closing the channel
// is the terminal signal that the final chunk has been flushed, after which
// the accumulated chunks may be concatenated into one artifact.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::capture::CaptureStream;

/// Default time slice between data-available notifications.
pub const DEFAULT_TIMESLICE: Duration = Duration::from_secs(1);

/// Default codec/container preference, matching what the artifact export
/// writes (`.webm`).
pub const DEFAULT_MIME_TYPE: &str = "video/webm;codecs=vp9";

/// Error type for recorder operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    /// The platform could not create a recorder for the given stream/codec.
    #[error("could not initialize encoder: {0}")]
    EncoderInit(String),
}

/// Codec/container preference and chunking granularity for a recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderPreferences {
    pub mime_type: String,
    /// Interval between data-available notifications.
    pub timeslice: Duration,
}

impl Default for RecorderPreferences {
    fn default() -> Self {
        Self {
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            timeslice: DEFAULT_TIMESLICE,
        }
    }
}

/// A time-sliced fragment of encoded media, delivered in arrival order.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    pub data: Vec<u8>,
    /// Position of this chunk in the delivery sequence, starting at 0.
    pub sequence: u64,
}

/// Receiving end of a recorder's data-available notifications. The sender
/// side is dropped once the final chunk has been flushed.
pub type ChunkReceiver = mpsc::UnboundedReceiver<EncodedChunk>;

/// Sender side handed to recorder implementations.
pub type ChunkSender = mpsc::UnboundedSender<EncodedChunk>;

/// An active platform recorder bound to one capture stream.
///
/// `pause`/`resume` are tolerant of out-of-sequence calls (the platform
/// treats them as no-ops); `stop` triggers the final flush, whose completion
/// is observed by the chunk channel closing.
pub trait MediaRecorder: Send {
    fn start(&mut self) -> Result<(), EncodingError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
}

/// Platform seam for constructing recorders.
pub trait RecorderFactory: Send + Sync {
    /// Build a recorder for `stream` with the given preferences. Fails with
    /// `EncoderInit` when the platform cannot encode the stream with the
    /// requested codec.
    fn create_recorder(
        &self,
        stream: &CaptureStream,
        prefs: &RecorderPreferences,
    ) -> Result<(Box<dyn MediaRecorder>, ChunkReceiver), EncodingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preferences_match_export_container() {
        let prefs = RecorderPreferences::default();
        assert!(prefs.mime_type.starts_with("video/webm"));
        assert_eq!(prefs.timeslice, Duration::from_secs(1));
    }
}
