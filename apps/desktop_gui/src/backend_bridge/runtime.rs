//! Backend worker: a dedicated thread owning the async runtime and the
//! recognition client. Commands arrive over the bounded queue; outcomes go
//! back to the UI as events.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use recognizer::GestureRecognizer;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::session::RecognitionOutcome;

pub fn launch(
    recognizer: Arc<dyn GestureRecognizer>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendStartupFailed(format!(
                    "failed to build backend runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
            while let Ok(cmd) = cmd_rx.recv() {
                handle_command(recognizer.as_ref(), cmd, &ui_tx).await;
            }
        });
    });
}

async fn handle_command(
    recognizer: &dyn GestureRecognizer,
    cmd: BackendCommand,
    ui_tx: &Sender<UiEvent>,
) {
    match cmd {
        BackendCommand::Recognize { generation, frame } => {
            tracing::info!(
                generation,
                frame_bytes = frame.bytes.len(),
                "backend: recognize"
            );
            let outcome = match recognizer.recognize(&frame).await {
                Ok(Some(number)) => RecognitionOutcome::Reading(number),
                Ok(None) => RecognitionOutcome::Miss,
                Err(err) => {
                    tracing::error!("backend: recognize failed: {err}");
                    RecognitionOutcome::Failed(err.user_message())
                }
            };
            let _ = ui_tx.try_send(UiEvent::RecognitionFinished {
                generation,
                outcome,
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
