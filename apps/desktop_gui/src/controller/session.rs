//! Session state machine: camera off/on, one in-flight recognition, result
//! or error display.

use shared::domain::is_confident_gesture;

pub const RECOGNITION_MISS_MESSAGE: &str = "Could not recognize a number. Please try again.";
pub const GENERIC_FAILURE_MESSAGE: &str = "An unknown error occurred.";

/// What the backend worker learned about one captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Structurally valid integer from the service, including `0`.
    Reading(i64),
    /// The service answered but the body could not be parsed into a number.
    Miss,
    /// The remote call itself failed; carries the user-facing message.
    Failed(String),
}

/// The controller's single mutable record. Written only on the UI thread.
///
/// Invariants: at most one of `result`/`error_message` is set; while
/// `loading` both are cleared. Outcomes are stamped with a capture
/// generation so anything that completes after the session moved on is
/// discarded.
#[derive(Debug, Default)]
pub struct SessionState {
    camera_enabled: bool,
    loading: bool,
    result: Option<i64>,
    error_message: Option<String>,
    generation: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera_enabled(&self) -> bool {
        self.camera_enabled
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<i64> {
        self.result
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Camera toggled. Clears result/error either way; an in-flight
    /// recognition becomes stale.
    pub fn set_camera(&mut self, enabled: bool) {
        self.camera_enabled = enabled;
        self.loading = false;
        self.result = None;
        self.error_message = None;
    }

    /// Start one capture. Returns the generation stamp for the in-flight
    /// request, or `None` when the trigger must be ignored (camera off or a
    /// request already in flight).
    pub fn begin_capture(&mut self) -> Option<u64> {
        if !self.camera_enabled || self.loading {
            return None;
        }
        self.loading = true;
        self.result = None;
        self.error_message = None;
        self.generation = self.generation.wrapping_add(1);
        Some(self.generation)
    }

    /// Apply the outcome of the capture stamped `generation`. Stale outcomes
    /// (camera toggled meanwhile, or a newer capture started) are dropped.
    pub fn apply_outcome(&mut self, generation: u64, outcome: RecognitionOutcome) {
        if !self.loading || generation != self.generation {
            tracing::debug!(generation, "dropping stale recognition outcome");
            return;
        }
        self.loading = false;
        match outcome {
            RecognitionOutcome::Reading(number) if is_confident_gesture(number) => {
                self.result = Some(number);
            }
            RecognitionOutcome::Reading(_) | RecognitionOutcome::Miss => {
                self.error_message = Some(RECOGNITION_MISS_MESSAGE.to_string());
            }
            RecognitionOutcome::Failed(message) => {
                self.error_message = Some(if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message
                });
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
