// Scenario definitions
//
// Each scenario builds a fresh controller on the headless backend, exercises
// one workflow, and returns the list of check failures (empty means pass).
// Scenarios run on a real clock, so recording phases are kept short.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::capture::HeadlessBackend;
use crate::config::Config;
use crate::controller::RecorderController;
use crate::notifications::{Notification, Notifier};
use crate::selection::{Point, SelectionOutcome, SelectionRect};
use crate::session::{RecordingStatus, SessionError};

pub type ScenarioFuture = Pin<Box<dyn Future<Output = Vec<String>> + Send>>;

pub struct Scenario {
    pub name: &'static str,
    pub run: fn() -> ScenarioFuture,
}

/// All scenarios, in execution order.
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "record_stop_save",
            run: || Box::pin(record_stop_save()),
        },
        Scenario {
            name: "pause_resume_elapsed",
            run: || Box::pin(pause_resume_elapsed()),
        },
        Scenario {
            name: "area_selection_accepted",
            run: || Box::pin(area_selection_accepted()),
        },
        Scenario {
            name: "area_selection_below_threshold",
            run: || Box::pin(area_selection_below_threshold()),
        },
        Scenario {
            name: "permission_denied_surfaces_reason",
            run: || Box::pin(permission_denied_surfaces_reason()),
        },
        Scenario {
            name: "encoder_failure_releases_stream",
            run: || Box::pin(encoder_failure_releases_stream()),
        },
        Scenario {
            name: "implicit_restart_leaks_nothing",
            run: || Box::pin(implicit_restart_leaks_nothing()),
        },
        Scenario {
            name: "zoom_clamps",
            run: || Box::pin(zoom_clamps()),
        },
    ]
}

fn check(errors: &mut Vec<String>, ok: bool, message: &str) {
    if !ok {
        errors.push(message.to_string());
    }
}

#[derive(Default)]
struct CollectingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}

struct Fixture {
    controller: RecorderController,
    backend: Arc<HeadlessBackend>,
    notifier: Arc<CollectingNotifier>,
    _storage: Option<tempfile::TempDir>,
}

fn fixture_with(backend: HeadlessBackend, storage: Option<tempfile::TempDir>) -> Fixture {
    let backend = Arc::new(backend);
    let notifier = Arc::new(CollectingNotifier::default());
    let storage_path = storage
        .as_ref()
        .map(|d| d.path().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let controller = RecorderController::with_notifier(
        backend.clone(),
        Config {
            storage_path,
            ..Config::default()
        },
        notifier.clone(),
    );
    Fixture {
        controller,
        backend,
        notifier,
        _storage: storage,
    }
}

fn fixture(backend: HeadlessBackend) -> Fixture {
    fixture_with(backend, None)
}

async fn record_stop_save() -> Vec<String> {
    let mut errors = Vec::new();
    let storage = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => return vec![format!("could not create temp dir: {}", e)],
    };
    let f = fixture_with(HeadlessBackend::new().with_chunk_bytes(256), Some(storage));

    if let Err(e) = f.controller.start_fullscreen().await {
        return vec![format!("start failed: {}", e)];
    }
    tokio::time::sleep(Duration::from_millis(2100)).await;

    if let Err(e) = f.controller.stop().await {
        return vec![format!("stop failed: {}", e)];
    }

    let artifact = match f.controller.preview_artifact() {
        Some(a) => a,
        None => return vec!["no artifact after stop".to_string()],
    };
    check(&mut errors, artifact.duration_seconds >= 2.0, "duration under 2s");
    check(&mut errors, !artifact.data.is_empty(), "artifact data empty");
    check(
        &mut errors,
        artifact.access_url.starts_with("blob:screencast/"),
        "access url missing",
    );

    match f.controller.save_recording() {
        Ok(Some(path)) => {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            check(
                &mut errors,
                name.starts_with("screen-recording-") && name.ends_with(".webm"),
                "export filename pattern mismatch",
            );
            check(&mut errors, path.exists(), "exported file missing");
        }
        Ok(None) => errors.push("nothing to save after stop".to_string()),
        Err(e) => errors.push(format!("save failed: {}", e)),
    }

    check(&mut errors, f.backend.all_tracks_stopped(), "capture tracks left live");
    check(
        &mut errors,
        f.controller.manager().blob_urls().live_urls() == 0,
        "blob url leaked after save",
    );
    errors
}

async fn pause_resume_elapsed() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::new());

    if let Err(e) = f.controller.start_fullscreen().await {
        return vec![format!("start failed: {}", e)];
    }
    tokio::time::sleep(Duration::from_millis(1100)).await;
    f.controller.pause();
    let at_pause = f.controller.elapsed_seconds();
    check(&mut errors, at_pause == 1, "elapsed not 1 at pause");
    check(
        &mut errors,
        f.controller.manager().status() == RecordingStatus::Paused,
        "status not paused",
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    check(
        &mut errors,
        f.controller.elapsed_seconds() == at_pause,
        "ticker advanced while paused",
    );

    f.controller.resume();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    check(
        &mut errors,
        f.controller.elapsed_seconds() == at_pause + 1,
        "ticker did not continue after resume",
    );
    check(
        &mut errors,
        f.controller.elapsed_display() == "00:02",
        "elapsed display mismatch",
    );

    if let Err(e) = f.controller.stop().await {
        errors.push(format!("stop failed: {}", e));
    }
    f.controller.discard_recording();
    errors
}

async fn area_selection_accepted() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::new());

    f.controller.begin_area_selection();
    f.controller.pointer_down(Point::new(100, 100));
    f.controller.pointer_move(Point::new(250, 260));
    match f.controller.pointer_up().await {
        Ok(Some(SelectionOutcome::Accepted(rect))) => {
            let expected = SelectionRect {
                x: 100,
                y: 100,
                width: 150,
                height: 160,
            };
            check(&mut errors, rect == expected, "selection rect mismatch");
        }
        Ok(other) => errors.push(format!("unexpected selection outcome: {:?}", other)),
        Err(e) => errors.push(format!("selection start failed: {}", e)),
    }

    check(
        &mut errors,
        f.controller.manager().status() == RecordingStatus::Recording,
        "recording did not start after accepted selection",
    );
    if let Err(e) = f.controller.stop().await {
        errors.push(format!("stop failed: {}", e));
    }
    f.controller.discard_recording();
    errors
}

async fn area_selection_below_threshold() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::new());

    f.controller.begin_area_selection();
    f.controller.pointer_down(Point::new(10, 10));
    f.controller.pointer_move(Point::new(15, 12));
    match f.controller.pointer_up().await {
        Ok(Some(SelectionOutcome::Cancelled)) => {}
        Ok(other) => errors.push(format!("expected cancellation, got {:?}", other)),
        Err(e) => errors.push(format!("pointer_up failed: {}", e)),
    }
    check(
        &mut errors,
        f.controller.manager().status() == RecordingStatus::Idle,
        "recording started from a sub-threshold drag",
    );
    errors
}

async fn permission_denied_surfaces_reason() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::denying("user dismissed the picker"));

    match f.controller.start_fullscreen().await {
        Err(SessionError::Capture(_)) => {}
        other => errors.push(format!("expected capture error, got {:?}", other.err())),
    }

    let seen = f.notifier.seen.lock();
    check(&mut errors, seen.len() == 1, "expected one failure notification");
    if let Some(n) = seen.first() {
        check(&mut errors, n.is_error, "notification not marked error");
        check(
            &mut errors,
            n.body.contains("user dismissed the picker"),
            "reason missing from notification",
        );
    }
    errors
}

async fn encoder_failure_releases_stream() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::without_encoder());

    match f.controller.start_fullscreen().await {
        Err(SessionError::Encoder(_)) => {}
        other => errors.push(format!("expected encoder error, got {:?}", other.err())),
    }
    check(
        &mut errors,
        f.controller.manager().status() == RecordingStatus::Idle,
        "session not idle after encoder failure",
    );
    check(&mut errors, f.backend.all_tracks_stopped(), "stream leaked on encoder failure");
    errors
}

async fn implicit_restart_leaks_nothing() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::new());

    if let Err(e) = f.controller.start_fullscreen().await {
        return vec![format!("first start failed: {}", e)];
    }
    tokio::time::sleep(Duration::from_millis(1100)).await;
    if let Err(e) = f.controller.start_window().await {
        return vec![format!("second start failed: {}", e)];
    }

    check(&mut errors, f.backend.issued_streams() == 2, "expected two issued streams");
    check(
        &mut errors,
        f.controller.manager().blob_urls().live_urls() == 0,
        "implicitly-stopped artifact url leaked",
    );
    check(
        &mut errors,
        f.controller.manager().status() == RecordingStatus::Recording,
        "second session not recording",
    );

    if let Err(e) = f.controller.stop().await {
        errors.push(format!("stop failed: {}", e));
    }
    f.controller.discard_recording();
    check(&mut errors, f.backend.all_tracks_stopped(), "tracks left live after stop");
    errors
}

async fn zoom_clamps() -> Vec<String> {
    let mut errors = Vec::new();
    let f = fixture(HeadlessBackend::new());

    for _ in 0..10 {
        f.controller.zoom_in();
    }
    check(
        &mut errors,
        f.controller.manager().zoom_factor() == 5.0,
        "zoom did not clamp at 5.0",
    );
    f.controller.manager().set_zoom_factor(0.0);
    check(
        &mut errors,
        f.controller.manager().zoom_factor() == 1.0,
        "zoom did not clamp at 1.0",
    );
    errors
}
