//! Screen capture to timestamped image files.
//!
//! Captures the primary monitor (or a pixel region of it) with `xcap`,
//! encodes PNG or JPEG, and writes `screenshot_<timestamp>.<ext>` files into
//! the screenshots directory. Also hosts the startup retention sweep that
//! removes old screenshots.

use crate::pipeline::CaptureSource;
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{info, warn};
use xcap::Monitor;

/// Capture errors
#[derive(Debug, Error)]
pub(crate) enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitor available for capture")]
    NoMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Invalid capture region: {0}")]
    InvalidRegion(String),

    #[error("Region ({left},{top})-({right},{bottom}) exceeds screen bounds {width}x{height}")]
    OutOfBounds {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        width: u32,
        height: u32,
    },

    #[error("Failed to encode screenshot: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write screenshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// On-disk image format for captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CaptureFormat {
    Png,
    Jpeg,
    /// Unrecognized format name, passed through to the encoder by extension.
    Other(String),
}

impl CaptureFormat {
    pub(crate) fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            other => Self::Other(other.to_string()),
        }
    }

    pub(crate) fn extension(&self) -> &str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Other(ext) => ext,
        }
    }
}

/// A capture written to disk. The file is never deleted by the pipeline;
/// only the retention sweep removes old ones.
#[derive(Debug, Clone)]
pub(crate) struct CaptureArtifact {
    pub(crate) path: PathBuf,
    pub(crate) taken_at: DateTime<Local>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: CaptureFormat,
}

/// Pixel rectangle on the primary monitor, edges `[left, right)` and
/// `[top, bottom)`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegionBounds {
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) right: i32,
    pub(crate) bottom: i32,
}

impl RegionBounds {
    pub(crate) fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Reject malformed rectangles before any OS call is made.
    fn validate(&self) -> Result<(), CaptureError> {
        if self.left < 0 || self.top < 0 {
            return Err(CaptureError::InvalidRegion(format!(
                "origin must be non-negative, got ({}, {})",
                self.left, self.top
            )));
        }
        if self.right <= self.left || self.bottom <= self.top {
            return Err(CaptureError::InvalidRegion(format!(
                "empty rectangle ({}, {}, {}, {})",
                self.left, self.top, self.right, self.bottom
            )));
        }
        Ok(())
    }

    fn offset_and_size(&self) -> (u32, u32, u32, u32) {
        (
            self.left as u32,
            self.top as u32,
            (self.right - self.left) as u32,
            (self.bottom - self.top) as u32,
        )
    }
}

/// Captures the primary monitor and writes image files.
pub(crate) struct ScreenCapturer {
    dir: PathBuf,
    format: CaptureFormat,
    jpeg_quality: u8,
}

impl ScreenCapturer {
    pub(crate) fn new(dir: &Path, format: CaptureFormat, jpeg_quality: u8) -> Self {
        Self {
            dir: dir.to_path_buf(),
            format,
            jpeg_quality,
        }
    }

    /// Capture the full primary monitor.
    pub(crate) fn capture_full(&self) -> Result<CaptureArtifact, CaptureError> {
        let image = grab_primary_monitor()?;
        self.write_artifact(&image, "screenshot")
    }

    /// Capture a pixel region of the primary monitor.
    pub(crate) fn capture_region(
        &self,
        bounds: RegionBounds,
    ) -> Result<CaptureArtifact, CaptureError> {
        bounds.validate()?;

        let image = grab_primary_monitor()?;
        let (x, y, width, height) = bounds.offset_and_size();
        if x + width > image.width() || y + height > image.height() {
            return Err(CaptureError::OutOfBounds {
                left: bounds.left,
                top: bounds.top,
                right: bounds.right,
                bottom: bounds.bottom,
                width: image.width(),
                height: image.height(),
            });
        }

        let cropped = image.crop_imm(x, y, width, height);
        self.write_artifact(&cropped, "screenshot_region")
    }

    /// Encode and write the image under a timestamped filename.
    ///
    /// Timestamps have one-second granularity; the pipeline's single
    /// in-flight slot keeps names unique in practice.
    fn write_artifact(
        &self,
        image: &DynamicImage,
        prefix: &str,
    ) -> Result<CaptureArtifact, CaptureError> {
        let taken_at = Local::now();
        let timestamp = taken_at.format("%Y-%m-%d_%H-%M-%S");
        let filename = format!("{}_{}.{}", prefix, timestamp, self.format.extension());
        let path = self.dir.join(filename);

        self.encode_to(image, &path)?;
        info!(
            "Screenshot saved: {:?} ({}x{} pixels)",
            path,
            image.width(),
            image.height()
        );

        Ok(CaptureArtifact {
            path,
            taken_at,
            width: image.width(),
            height: image.height(),
            format: self.format.clone(),
        })
    }

    fn encode_to(&self, image: &DynamicImage, path: &Path) -> Result<(), CaptureError> {
        let create = |path: &Path| {
            fs::File::create(path).map_err(|e| CaptureError::Write {
                path: path.to_path_buf(),
                source: e,
            })
        };

        match &self.format {
            CaptureFormat::Png => {
                let writer = BufWriter::new(create(path)?);
                let rgba = image.to_rgba8();
                PngEncoder::new(writer).write_image(
                    rgba.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::Rgba8,
                )?;
            }
            CaptureFormat::Jpeg => {
                let writer = BufWriter::new(create(path)?);
                // JPEG carries no alpha channel
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(writer, self.jpeg_quality).write_image(
                    rgb.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::Rgb8,
                )?;
            }
            CaptureFormat::Other(_) => {
                image.save(path)?;
            }
        }
        Ok(())
    }
}

impl CaptureSource for ScreenCapturer {
    fn capture(&self) -> Result<CaptureArtifact, CaptureError> {
        self.capture_full()
    }
}

fn grab_primary_monitor() -> Result<DynamicImage, CaptureError> {
    let monitors =
        Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    let primary = monitors
        .into_iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| {
            // No monitor reports as primary; fall back to the first one
            let all = Monitor::all().ok()?;
            all.into_iter().next()
        })
        .ok_or(CaptureError::NoMonitor)?;

    let image = primary
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    Ok(DynamicImage::ImageRgba8(image))
}

/// Delete screenshots older than `max_age_days`. Returns how many were
/// removed; all failures are logged and skipped.
pub(crate) fn cleanup_old_screenshots(dir: &Path, max_age_days: u32) -> u32 {
    let max_age = Duration::from_secs(u64::from(max_age_days) * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut deleted = 0u32;

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Screenshot cleanup skipped: {}", e);
            return 0;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_screenshot = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("screenshot"))
            .unwrap_or(false);
        if !is_screenshot {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let Ok(age) = now.duration_since(modified) else {
            continue;
        };

        if age > max_age {
            match fs::remove_file(&path) {
                Ok(()) => {
                    deleted += 1;
                    info!("Deleted old screenshot: {:?}", path);
                }
                Err(e) => warn!("Failed to delete {:?}: {}", path, e),
            }
        }
    }

    if deleted > 0 {
        info!("Cleaned up {} old screenshots", deleted);
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgba([120, 40, 200, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(CaptureFormat::from_name("png"), CaptureFormat::Png);
        assert_eq!(CaptureFormat::from_name("PNG"), CaptureFormat::Png);
        assert_eq!(CaptureFormat::from_name("jpg"), CaptureFormat::Jpeg);
        assert_eq!(CaptureFormat::from_name("jpeg"), CaptureFormat::Jpeg);
        assert_eq!(
            CaptureFormat::from_name("webp"),
            CaptureFormat::Other("webp".to_string())
        );
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(CaptureFormat::Png.extension(), "png");
        assert_eq!(CaptureFormat::Jpeg.extension(), "jpeg");
        assert_eq!(CaptureFormat::Other("webp".to_string()).extension(), "webp");
    }

    #[test]
    fn test_region_validation_rejects_negative_origin() {
        let err = RegionBounds::new(-5, 0, 100, 100).validate().expect_err("negative");
        assert!(matches!(err, CaptureError::InvalidRegion(_)));
    }

    #[test]
    fn test_region_validation_rejects_empty_rectangle() {
        let err = RegionBounds::new(100, 0, 100, 50).validate().expect_err("zero width");
        assert!(matches!(err, CaptureError::InvalidRegion(_)));

        let err = RegionBounds::new(0, 80, 50, 20).validate().expect_err("inverted");
        assert!(matches!(err, CaptureError::InvalidRegion(_)));
    }

    #[test]
    fn test_region_validation_accepts_proper_rectangle() {
        assert!(RegionBounds::new(0, 0, 640, 480).validate().is_ok());
        let (x, y, w, h) = RegionBounds::new(10, 20, 110, 70).offset_and_size();
        assert_eq!((x, y, w, h), (10, 20, 100, 50));
    }

    #[test]
    fn test_png_artifact_is_decodable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let capturer = ScreenCapturer::new(dir.path(), CaptureFormat::Png, 95);

        let artifact = capturer
            .write_artifact(&test_image(4, 2), "screenshot")
            .expect("write");

        assert_eq!((artifact.width, artifact.height), (4, 2));
        assert_eq!(artifact.format, CaptureFormat::Png);
        let name = artifact.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));

        let decoded = image::open(&artifact.path).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn test_jpeg_artifact_is_decodable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let capturer = ScreenCapturer::new(dir.path(), CaptureFormat::Jpeg, 95);

        let artifact = capturer
            .write_artifact(&test_image(6, 4), "screenshot")
            .expect("write");

        assert!(artifact.path.to_string_lossy().ends_with(".jpeg"));
        let decoded = image::open(&artifact.path).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }

    #[test]
    fn test_region_prefix_in_filename() {
        let dir = tempfile::tempdir().expect("tempdir");
        let capturer = ScreenCapturer::new(dir.path(), CaptureFormat::Png, 95);

        let artifact = capturer
            .write_artifact(&test_image(2, 2), "screenshot_region")
            .expect("write");
        let name = artifact.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("screenshot_region_"));
    }

    #[test]
    fn test_cleanup_skips_non_screenshot_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("screenshot_a.png"), b"img").expect("write");
        fs::write(dir.path().join("keep.txt"), b"notes").expect("write");
        std::thread::sleep(Duration::from_millis(100));

        let deleted = cleanup_old_screenshots(dir.path(), 0);
        assert_eq!(deleted, 1);
        assert!(!dir.path().join("screenshot_a.png").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_cleanup_keeps_recent_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("screenshot_recent.png"), b"img").expect("write");

        let deleted = cleanup_old_screenshots(dir.path(), 7);
        assert_eq!(deleted, 0);
        assert!(dir.path().join("screenshot_recent.png").exists());
    }

    #[test]
    fn test_cleanup_missing_dir_is_harmless() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("gone");
        assert_eq!(cleanup_old_screenshots(&missing, 7), 0);
    }
}
