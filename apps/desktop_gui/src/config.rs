//! Settings layering: built-in defaults, then the optional config file, then
//! environment overrides. The API key only ever comes from the environment
//! and is required at startup.

use std::fs;

use serde::Deserialize;
use shared::domain::CameraPreferences;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const CONFIG_FILE: &str = "gesture_desk.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: Option<String>,
    pub camera: CameraPreferences,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: recognizer::DEFAULT_MODEL.to_string(),
            api_base_url: None,
            camera: CameraPreferences::default(),
        }
    }
}

impl Settings {
    /// The missing credential is a fatal startup condition, not a runtime
    /// recoverable error.
    pub fn require_api_key(&self) -> anyhow::Result<String> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => Ok(key.clone()),
            _ => anyhow::bail!("{API_KEY_ENV} environment variable is not set"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    model: Option<String>,
    api_base_url: Option<String>,
    camera_index: Option<u32>,
    capture_width: Option<u32>,
    capture_height: Option<u32>,
    jpeg_quality: Option<u8>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => tracing::warn!("ignoring malformed {CONFIG_FILE}: {err}"),
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, file: FileSettings) {
    if let Some(v) = file.model {
        settings.model = v;
    }
    if let Some(v) = file.api_base_url {
        settings.api_base_url = Some(v);
    }
    if let Some(v) = file.camera_index {
        settings.camera.camera_index = v;
    }
    if let Some(v) = file.capture_width {
        settings.camera.capture_width = v;
    }
    if let Some(v) = file.capture_height {
        settings.camera.capture_height = v;
    }
    if let Some(v) = file.jpeg_quality {
        settings.camera.jpeg_quality = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var(API_KEY_ENV) {
        settings.api_key = Some(v);
    }
    if let Some(v) = var("APP__MODEL") {
        settings.model = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = Some(v);
    }
    if let Some(v) = var("APP__CAMERA_INDEX") {
        if let Ok(parsed) = v.parse() {
            settings.camera.camera_index = parsed;
        }
    }
    if let Some(v) = var("APP__CAPTURE_WIDTH") {
        if let Ok(parsed) = v.parse() {
            settings.camera.capture_width = parsed;
        }
    }
    if let Some(v) = var("APP__CAPTURE_HEIGHT") {
        if let Ok(parsed) = v.parse() {
            settings.camera.capture_height = parsed;
        }
    }
    if let Some(v) = var("APP__JPEG_QUALITY") {
        if let Ok(parsed) = v.parse() {
            settings.camera.jpeg_quality = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn file_settings_layer_over_defaults() {
        let mut settings = Settings::default();
        let file: FileSettings = toml::from_str(
            r#"
            model = "gemini-exp"
            camera_index = 2
            jpeg_quality = 75
            "#,
        )
        .expect("parse");
        apply_file_settings(&mut settings, file);

        assert_eq!(settings.model, "gemini-exp");
        assert_eq!(settings.camera.camera_index, 2);
        assert_eq!(settings.camera.jpeg_quality, 75);
        // Untouched fields keep their defaults.
        assert_eq!(settings.camera.capture_width, 1280);
        assert_eq!(settings.camera.capture_height, 720);
    }

    #[test]
    fn env_overrides_win_over_file_settings() {
        let mut settings = Settings::default();
        settings.model = "from-file".to_string();

        apply_env_overrides(&mut settings, |name| match name {
            "APP__MODEL" => Some("from-env".to_string()),
            "APP__CAMERA_INDEX" => Some("1".to_string()),
            _ => None,
        });

        assert_eq!(settings.model, "from-env");
        assert_eq!(settings.camera.camera_index, 1);
    }

    #[test]
    fn unparseable_numeric_overrides_are_ignored() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| match name {
            "APP__CAMERA_INDEX" => Some("front".to_string()),
            "APP__JPEG_QUALITY" => Some("ninety".to_string()),
            _ => None,
        });

        assert_eq!(settings.camera.camera_index, 0);
        assert_eq!(settings.camera.jpeg_quality, 90);
    }

    #[test]
    fn api_key_is_required() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, no_env);
        assert!(settings.require_api_key().is_err());

        settings.api_key = Some("   ".to_string());
        assert!(settings.require_api_key().is_err());

        settings.api_key = Some("key-123".to_string());
        assert_eq!(settings.require_api_key().expect("key"), "key-123");
    }
}
