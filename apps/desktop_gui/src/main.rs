use std::sync::Arc;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::Context as _;
use capture::{enumerate_cameras, CameraSource};
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use recognizer::GeminiRecognizer;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::GestureApp;

#[derive(Debug, Parser)]
#[command(
    name = "gesture-desk",
    about = "Show a hand gesture to the camera; a remote model guesses the number."
)]
struct Args {
    /// List cameras visible to the local backend and exit.
    #[arg(long)]
    list_cameras: bool,

    /// Camera index to open (overrides config).
    #[arg(long)]
    camera_index: Option<u32>,

    /// Remote model identifier (overrides config).
    #[arg(long)]
    model: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    if args.list_cameras {
        let cameras = enumerate_cameras().context("camera enumeration failed")?;
        if cameras.is_empty() {
            println!("No cameras detected.");
        }
        for camera in cameras {
            println!("{:<8} {:<32} {}", camera.index, camera.name, camera.description);
        }
        return Ok(());
    }

    let mut settings = config::load_settings();
    if let Some(camera_index) = args.camera_index {
        settings.camera.camera_index = camera_index;
    }
    if let Some(model) = args.model {
        settings.model = model;
    }
    let api_key = settings.require_api_key()?;

    let mut recognizer = GeminiRecognizer::new(api_key, settings.model.clone())
        .context("failed to build recognition client")?;
    if let Some(base_url) = &settings.api_base_url {
        recognizer = recognizer.with_base_url(base_url.clone());
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(8);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    backend_bridge::runtime::launch(Arc::new(recognizer), cmd_rx, ui_tx);

    let source = CameraSource::new(settings.camera);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Gesture to Number")
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Gesture to Number",
        options,
        Box::new(move |_cc| Ok(Box::new(GestureApp::new(cmd_tx, ui_rx, Box::new(source))))),
    )
    .map_err(|err| anyhow::anyhow!("desktop shell failed: {err}"))
}
