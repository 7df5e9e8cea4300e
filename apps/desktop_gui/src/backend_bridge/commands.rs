//! Backend commands queued from UI to backend worker.

use shared::domain::EncodedFrame;

pub enum BackendCommand {
    Recognize {
        generation: u64,
        frame: EncodedFrame,
    },
}
