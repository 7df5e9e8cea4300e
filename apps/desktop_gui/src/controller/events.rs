//! Backend-to-UI events for the desktop controller.

use crate::controller::session::RecognitionOutcome;

pub enum UiEvent {
    Info(String),
    BackendStartupFailed(String),
    RecognitionFinished {
        generation: u64,
        outcome: RecognitionOutcome,
    },
}
