// Recorded artifacts and revocable access handles
//
// A finished recording is one contiguous blob plus a revocable access URL
// minted by the registry. Consumers must revoke the URL when done with the
// artifact (discard, or after the preview is closed) so the registry does not
// retain blobs forever.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

/// File extension of exported recordings. Matches the default recorder
/// mime type (`video/webm`).
pub const EXPORT_EXTENSION: &str = "webm";

/// The finished recording product.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedArtifact {
    /// Concatenated encoded chunks.
    #[serde(skip)]
    pub data: Arc<Vec<u8>>,
    /// Revocable handle registered with the blob registry.
    pub access_url: String,
    pub created_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl RecordedArtifact {
    /// Filename used when this artifact is saved:
    /// `screen-recording-<ISO 8601 timestamp, colons replaced>.webm`.
    pub fn export_filename(&self) -> String {
        format!(
            "screen-recording-{}.{}",
            self.created_at.format("%Y-%m-%dT%H-%M-%S"),
            EXPORT_EXTENSION
        )
    }

    /// Write the artifact into `dir` under its export filename.
    pub fn save_to(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.export_filename());
        std::fs::write(&path, self.data.as_slice())?;
        log::info!(
            "saved recording to {} ({} bytes, {:.1}s)",
            path.display(),
            self.data.len(),
            self.duration_seconds
        );
        Ok(path)
    }
}

/// Registry of live blob URLs.
///
/// Mints `blob:screencast/<uuid>` handles that resolve to artifact data until
/// revoked. Owned by the session manager; shared with whoever renders
/// previews.
#[derive(Debug, Default)]
pub struct BlobUrlRegistry {
    blobs: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return a fresh access URL for it.
    pub fn create_url(&self, data: Arc<Vec<u8>>) -> String {
        let url = format!("blob:screencast/{}", Uuid::new_v4());
        self.blobs.lock().insert(url.clone(), data);
        url
    }

    /// Look up the data behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.blobs.lock().get(url).cloned()
    }

    /// Drop a URL. Returns false if it was not live (already revoked or never
    /// minted), which callers may log but need not treat as an error.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.blobs.lock().remove(url).is_some();
        if !removed {
            log::debug!("revoke of unknown blob url {}", url);
        }
        removed
    }

    /// Number of URLs currently live. Leak check for tests and validators.
    pub fn live_urls(&self) -> usize {
        self.blobs.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn artifact_at(ts: DateTime<Utc>) -> RecordedArtifact {
        RecordedArtifact {
            data: Arc::new(vec![1, 2, 3]),
            access_url: "blob:screencast/test".to_string(),
            created_at: ts,
            duration_seconds: 3.0,
        }
    }

    #[test]
    fn export_filename_replaces_colons() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 27, 14, 30, 5).unwrap();
        let artifact = artifact_at(ts);
        assert_eq!(
            artifact.export_filename(),
            "screen-recording-2026-08-27T14-30-05.webm"
        );
    }

    #[test]
    fn registry_mint_resolve_revoke() {
        let registry = BlobUrlRegistry::new();
        let data = Arc::new(vec![9u8; 16]);

        let url = registry.create_url(data.clone());
        assert!(url.starts_with("blob:screencast/"));
        assert_eq!(registry.live_urls(), 1);
        assert_eq!(registry.resolve(&url).as_deref(), Some(&*data));

        assert!(registry.revoke(&url));
        assert_eq!(registry.live_urls(), 0);
        assert!(registry.resolve(&url).is_none());

        // Double revoke reports not-live without panicking
        assert!(!registry.revoke(&url));
    }

    #[test]
    fn save_writes_artifact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let artifact = artifact_at(ts);

        let path = artifact.save_to(dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "screen-recording-2026-01-02T03-04-05.webm"
        );
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }
}
