use super::*;
use async_trait::async_trait;
use crossbeam_channel::bounded;
use recognizer::{ServiceError, StatusCode};
use shared::domain::{EncodedFrame, FRAME_MIME_JPEG};

enum Script {
    Reading(i64),
    Unparseable,
    Quota,
}

struct ScriptedRecognizer {
    script: Script,
}

#[async_trait]
impl GestureRecognizer for ScriptedRecognizer {
    async fn recognize(&self, _frame: &EncodedFrame) -> Result<Option<i64>, ServiceError> {
        match self.script {
            Script::Reading(number) => Ok(Some(number)),
            Script::Unparseable => Ok(None),
            Script::Quota => Err(ServiceError::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "quota exceeded".to_string(),
            }),
        }
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

async fn drive(script: Script, generation: u64) -> (u64, RecognitionOutcome) {
    let (ui_tx, ui_rx) = bounded(8);
    handle_command(
        &ScriptedRecognizer { script },
        BackendCommand::Recognize {
            generation,
            frame: test_frame(),
        },
        &ui_tx,
    )
    .await;

    match ui_rx.try_recv().expect("one event") {
        UiEvent::RecognitionFinished {
            generation,
            outcome,
        } => (generation, outcome),
        _ => panic!("unexpected event kind"),
    }
}

#[tokio::test]
async fn forwards_a_reading_with_its_generation_stamp() {
    let (generation, outcome) = drive(Script::Reading(7), 3).await;
    assert_eq!(generation, 3);
    assert_eq!(outcome, RecognitionOutcome::Reading(7));
}

#[tokio::test]
async fn forwards_zero_readings_untouched() {
    let (_, outcome) = drive(Script::Reading(0), 1).await;
    assert_eq!(outcome, RecognitionOutcome::Reading(0));
}

#[tokio::test]
async fn unparseable_answers_become_a_miss() {
    let (_, outcome) = drive(Script::Unparseable, 1).await;
    assert_eq!(outcome, RecognitionOutcome::Miss);
}

#[tokio::test]
async fn service_failures_carry_the_user_message() {
    let (_, outcome) = drive(Script::Quota, 1).await;
    assert_eq!(
        outcome,
        RecognitionOutcome::Failed("quota exceeded".to_string())
    );
}
