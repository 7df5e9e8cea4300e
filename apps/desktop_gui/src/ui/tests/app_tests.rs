use super::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use capture::CaptureError;
use crossbeam_channel::bounded;
use shared::domain::{EncodedFrame, PreviewFrame, FRAME_MIME_JPEG};

#[derive(Default)]
struct SourceLog {
    opens: usize,
    closes: usize,
    open_now: bool,
}

/// Frame source double: scripted capture results plus an acquire/release
/// ledger that panics on double-acquire.
struct ScriptedSource {
    log: Arc<Mutex<SourceLog>>,
    frames: VecDeque<Option<EncodedFrame>>,
}

impl ScriptedSource {
    fn new(frames: Vec<Option<EncodedFrame>>) -> (Self, Arc<Mutex<SourceLog>>) {
        let log = Arc::new(Mutex::new(SourceLog::default()));
        (
            Self {
                log: Arc::clone(&log),
                frames: frames.into(),
            },
            log,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn enable(&mut self) -> Result<(), CaptureError> {
        let mut log = self.log.lock().expect("log");
        assert!(!log.open_now, "double-acquire of camera hardware");
        log.open_now = true;
        log.opens += 1;
        Ok(())
    }

    fn disable(&mut self) {
        let mut log = self.log.lock().expect("log");
        if log.open_now {
            log.open_now = false;
            log.closes += 1;
        }
    }

    fn is_enabled(&self) -> bool {
        self.log.lock().expect("log").open_now
    }

    fn capture_frame(&mut self) -> Option<EncodedFrame> {
        self.frames.pop_front().flatten()
    }

    fn preview_frame(&mut self) -> Option<PreviewFrame> {
        None
    }
}

fn test_frame() -> EncodedFrame {
    EncodedFrame {
        bytes: vec![0xFF, 0xD8],
        mime_type: FRAME_MIME_JPEG,
        width: 2,
        height: 1,
    }
}

struct Harness {
    app: GestureApp,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    log: Arc<Mutex<SourceLog>>,
}

fn harness(frames: Vec<Option<EncodedFrame>>) -> Harness {
    let (cmd_tx, cmd_rx) = bounded(8);
    let (ui_tx, ui_rx) = bounded(8);
    let (source, log) = ScriptedSource::new(frames);
    Harness {
        app: GestureApp::new(cmd_tx, ui_rx, Box::new(source)),
        cmd_rx,
        ui_tx,
        log,
    }
}

#[test]
fn toggle_cycles_keep_hardware_acquisition_in_lockstep() {
    let mut h = harness(Vec::new());

    for _ in 0..4 {
        h.app.enable_camera();
        assert!(h.app.session.camera_enabled());
        h.app.disable_camera();
        assert!(!h.app.session.camera_enabled());
    }

    let log = h.log.lock().expect("log");
    assert_eq!(log.opens, 4);
    assert_eq!(log.closes, 4);
    assert!(!log.open_now, "no leaked stream after repeated cycles");
}

#[test]
fn capture_queues_exactly_one_recognition_command() {
    let mut h = harness(vec![Some(test_frame()), Some(test_frame())]);
    h.app.enable_camera();

    h.app.trigger_capture();
    assert!(h.app.session.loading());
    let BackendCommand::Recognize { generation, frame } =
        h.cmd_rx.try_recv().expect("one command queued");
    assert_eq!(frame.mime_type, FRAME_MIME_JPEG);

    // A second trigger while the request is in flight is a no-op.
    h.app.trigger_capture();
    assert!(h.cmd_rx.try_recv().is_err(), "no duplicate command");
    assert!(h.app.session.loading());

    // Settle it through the event channel like the worker would.
    h.ui_tx
        .try_send(UiEvent::RecognitionFinished {
            generation,
            outcome: RecognitionOutcome::Reading(7),
        })
        .expect("send outcome");
    h.app.process_ui_events();
    assert_eq!(h.app.session.result(), Some(7));
    assert_eq!(h.app.session.error_message(), None);
    assert!(!h.app.session.loading());
}

#[test]
fn capture_with_no_frame_never_reaches_the_recognizer() {
    let mut h = harness(vec![None]);
    h.app.enable_camera();

    h.app.trigger_capture();
    assert!(h.cmd_rx.try_recv().is_err(), "no command queued");
    assert!(!h.app.session.loading());
    assert_eq!(
        h.app.session.error_message(),
        Some(crate::controller::session::RECOGNITION_MISS_MESSAGE)
    );
}

#[test]
fn capture_while_camera_is_off_is_ignored() {
    let mut h = harness(vec![Some(test_frame())]);

    h.app.trigger_capture();
    assert!(h.cmd_rx.try_recv().is_err());
    assert!(!h.app.session.loading());
    assert_eq!(h.app.session.error_message(), None);
}

#[test]
fn outcome_arriving_after_stop_is_ignored() {
    let mut h = harness(vec![Some(test_frame())]);
    h.app.enable_camera();
    h.app.trigger_capture();
    let BackendCommand::Recognize { generation, .. } =
        h.cmd_rx.try_recv().expect("command queued");

    h.app.disable_camera();
    h.ui_tx
        .try_send(UiEvent::RecognitionFinished {
            generation,
            outcome: RecognitionOutcome::Reading(9),
        })
        .expect("send outcome");
    h.app.process_ui_events();

    assert_eq!(h.app.session.result(), None);
    assert_eq!(h.app.session.error_message(), None);
}

#[test]
fn service_failure_message_reaches_the_banner() {
    let mut h = harness(vec![Some(test_frame())]);
    h.app.enable_camera();
    h.app.trigger_capture();
    let BackendCommand::Recognize { generation, .. } =
        h.cmd_rx.try_recv().expect("command queued");

    h.ui_tx
        .try_send(UiEvent::RecognitionFinished {
            generation,
            outcome: RecognitionOutcome::Failed("quota exceeded".to_string()),
        })
        .expect("send outcome");
    h.app.process_ui_events();

    assert_eq!(h.app.session.error_message(), Some("quota exceeded"));
    assert_eq!(h.app.session.result(), None);
}
