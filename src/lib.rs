// Screencast - screen recording session engine
// Main library entry point
//
// Two pieces of real behavior compose the core: the recording session
// manager (capture stream + recorder lifecycle, artifact assembly) and the
// area selector (drag gesture classification). `RecorderController` ties them
// together the way a recorder view does, on top of a pluggable capture
// platform; `HeadlessBackend` is the built-in deterministic implementation.

pub mod capture;
pub mod config;
pub mod controller;
pub mod encoding;
pub mod notifications;
pub mod selection;
pub mod session;

#[cfg(feature = "test-harness")]
pub mod test_harness;

pub use capture::{CaptureBackend, CaptureError, CaptureRequest, CaptureStream, HeadlessBackend};
pub use controller::RecorderController;
pub use selection::{AreaSelector, SelectionOutcome, SelectionRect};
pub use session::{
    BlobUrlRegistry, RecordedArtifact, RecordingSessionManager, RecordingStatus, SessionError,
};
