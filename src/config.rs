// Configuration management for Screencast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CursorPolicy;
use crate::encoding::{RecorderPreferences, DEFAULT_MIME_TYPE};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path where saved recordings are written
    pub storage_path: PathBuf,

    /// Whether system audio is captured by default
    #[serde(default)]
    pub audio_enabled: bool,

    /// Requested capture frame rate
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// How the cursor appears in captures
    #[serde(default)]
    pub cursor: CursorPolicy,

    /// Interval between encoded data slices, in milliseconds
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,

    /// Codec/container preference handed to the platform recorder
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Whether to notify when recording starts
    #[serde(default = "default_true")]
    pub notify_recording_start: bool,

    /// Whether to notify when recording stops
    #[serde(default = "default_true")]
    pub notify_recording_stop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: get_default_storage_path(),
            audio_enabled: false,
            frame_rate: default_frame_rate(),
            cursor: CursorPolicy::default(),
            chunk_interval_ms: default_chunk_interval_ms(),
            mime_type: default_mime_type(),
            notify_recording_start: true,
            notify_recording_stop: true,
        }
    }
}

impl Config {
    /// Load config from disk or return default
    pub fn load_or_default(config_dir: &Path) -> Self {
        let config_path = config_dir.join("config.toml");

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => {
                        log::warn!("Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, config_dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(config_dir)?;
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_dir.join("config.toml"), contents)?;
        Ok(())
    }

    /// Recorder preferences derived from this config.
    pub fn recorder_preferences(&self) -> RecorderPreferences {
        RecorderPreferences {
            mime_type: self.mime_type.clone(),
            timeslice: Duration::from_millis(self.chunk_interval_ms),
        }
    }
}

/// Get the default storage path for saved recordings
fn get_default_storage_path() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Videos")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Screencast")
}

/// Get the default config directory
pub fn get_default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screencast")
}

/// Default frame rate (for serde)
fn default_frame_rate() -> u32 {
    30
}

/// Default chunk interval (for serde)
fn default_chunk_interval_ms() -> u64 {
    1000
}

/// Default mime type (for serde)
fn default_mime_type() -> String {
    DEFAULT_MIME_TYPE.to_string()
}

/// Default true value (for serde)
fn default_true() -> bool {
    true
}
