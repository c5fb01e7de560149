// User-facing notifications
//
// The engine reports every lifecycle transition as a `Notification` through
// the `Notifier` seam; rendering (toast, desktop popup) is the embedder's
// concern. `LogNotifier` is the default sink.

use serde::{Deserialize, Serialize};

/// A short human-readable notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// True for failure notifications so the embedder can style them.
    pub is_error: bool,
}

impl Notification {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            is_error: false,
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            is_error: true,
        }
    }
}

/// Sink for notifications emitted by the recorder controller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default sink: writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        if notification.is_error {
            log::error!("{}: {}", notification.title, notification.body);
        } else {
            log::info!("{}: {}", notification.title, notification.body);
        }
    }
}

/// Notification when recording starts
pub fn recording_started() -> Notification {
    Notification::info("Recording started", "Your screen is now being recorded.")
}

/// Notification when recording stops and the artifact is ready
pub fn recording_completed(duration_secs: f64) -> Notification {
    Notification::info(
        "Recording completed",
        format!("Duration: {}", format_duration(duration_secs)),
    )
}

pub fn recording_paused() -> Notification {
    Notification::info("Recording", "Recording paused")
}

pub fn recording_resumed() -> Notification {
    Notification::info("Recording", "Recording resumed")
}

pub fn recording_saved(filename: &str) -> Notification {
    Notification::info("Recording saved", format!("Saved as {}", filename))
}

pub fn recording_discarded() -> Notification {
    Notification::info("Recording", "Recording discarded")
}

pub fn zoom_changed(factor: f64) -> Notification {
    Notification::info("Zoom", format!("Zoomed to {}x", factor))
}

/// Notification for failures; carries the error's reason
pub fn recording_failed(reason: &str) -> Notification {
    Notification::error("Recording failed", reason)
}

/// Format duration as human-readable string
pub fn format_duration(secs: f64) -> String {
    let total_secs = secs as u64;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format an elapsed-seconds counter as `MM:SS` for the recording timer.
pub fn format_elapsed(elapsed_secs: u64) -> String {
    format!("{:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(3.4), "0:03");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(3723.0), "1:02:03");
    }

    #[test]
    fn elapsed_formatting_is_zero_padded() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(3), "00:03");
        assert_eq!(format_elapsed(63), "01:03");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[test]
    fn zoom_notification_renders_factor() {
        assert_eq!(zoom_changed(1.5).body, "Zoomed to 1.5x");
        assert_eq!(zoom_changed(2.0).body, "Zoomed to 2x");
    }
}
