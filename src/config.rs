//! Application configuration
//!
//! Build-time settings come from the embedded `config.toml`; the Gemini
//! API key is read from the environment (a `.env` file is honored via
//! dotenvy in main). Output directories live under the user's Documents
//! folder and are created on demand.

use crate::error::AppError;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Application settings loaded from the embedded config.toml
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Settings {
    pub(crate) gemini: GeminiSettings,
    pub(crate) capture: CaptureSettings,
    pub(crate) slides: SlideSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeminiSettings {
    pub(crate) model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CaptureSettings {
    pub(crate) format: String,
    pub(crate) jpeg_quality: u8,
    pub(crate) retention_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlideSettings {
    pub(crate) width_in: f64,
    pub(crate) height_in: f64,
    pub(crate) image_width_in: f64,
    pub(crate) image_height_in: f64,
}

impl Settings {
    /// Load and validate settings from the embedded config.toml
    pub(crate) fn load() -> Result<Self, AppError> {
        const CONFIG_TOML: &str = include_str!("../config.toml");
        let settings: Settings = toml::from_str(CONFIG_TOML)
            .map_err(|e| AppError::Config(format!("Failed to parse config.toml: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        match self.capture.format.as_str() {
            "png" | "jpeg" | "jpg" => {}
            other => {
                return Err(AppError::Config(format!(
                    "Unsupported capture format '{}' (expected png or jpeg)",
                    other
                )));
            }
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(AppError::Config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.capture.jpeg_quality
            )));
        }
        if self.slides.image_width_in > self.slides.width_in
            || self.slides.image_height_in > self.slides.height_in
        {
            return Err(AppError::Config(
                "Slide image dimensions exceed the slide itself".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read the Gemini API key from the environment.
///
/// Returns a configuration error when the variable is missing or blank so
/// startup can fail before any hotkey is registered.
pub(crate) fn gemini_api_key() -> Result<String, AppError> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AppError::Config(
            "GEMINI_API_KEY environment variable is not set. Please check your .env file."
                .to_string(),
        )),
    }
}

/// Output locations for captures and presentations
#[derive(Debug, Clone)]
pub(crate) struct OutputDirs {
    pub(crate) screenshots: PathBuf,
    pub(crate) presentations: PathBuf,
}

impl OutputDirs {
    /// Resolve the output directories under Documents and create them.
    ///
    /// Idempotent; safe to call on every startup.
    pub(crate) fn ensure() -> Result<Self, AppError> {
        let root = dirs::document_dir()
            .ok_or_else(|| AppError::Config("Could not find Documents directory".to_string()))?
            .join("Deckhand");

        let dirs = Self {
            screenshots: root.join("screenshots"),
            presentations: root.join("presentations"),
        };

        for dir in [&dirs.screenshots, &dirs.presentations] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    AppError::Config(format!("Failed to create {}: {}", dir.display(), e))
                })?;
                info!("Created output directory: {:?}", dir);
            }
        }

        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_parses() {
        let settings = Settings::load().expect("embedded config.toml must be valid");
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert_eq!(settings.capture.format, "png");
        assert_eq!(settings.capture.jpeg_quality, 95);
        assert_eq!(settings.capture.retention_days, 7);
        assert!((settings.slides.width_in - 13.333).abs() < 1e-9);
        assert!((settings.slides.height_in - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let mut settings = Settings::load().expect("embedded config.toml must be valid");
        settings.capture.format = "bmp".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_quality() {
        let mut settings = Settings::load().expect("embedded config.toml must be valid");
        settings.capture.jpeg_quality = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_image() {
        let mut settings = Settings::load().expect("embedded config.toml must be valid");
        settings.slides.image_width_in = settings.slides.width_in + 1.0;
        assert!(settings.validate().is_err());
    }
}
