//! Session presentation document.
//!
//! One deck per session. The deck holds a title slide plus the content
//! slides appended for each capture, and rewrites the whole .pptx to disk
//! after every append, so the file is always complete and reopenable. The
//! file itself first appears on the first append.

pub(crate) mod export;
mod pptx;

use crate::analysis::Analysis;
use crate::capture::CaptureArtifact;
use crate::config::SlideSettings;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use pptx::{Align, MediaItem, Paragraph, Rect, Rgb, Shape, SlideContent};

/// Summary text longer than this is truncated on the notes slide.
const MAX_SUMMARY_CHARS: usize = 800;

const HEADING_BLUE: Rgb = Rgb(0x2E, 0x74, 0xB5);
const TITLE_DARK_BLUE: Rgb = Rgb(0x1F, 0x49, 0x7D);
const HEADING_RED: Rgb = Rgb(0xC0, 0x50, 0x4D);
const BODY_GRAY: Rgb = Rgb(0x33, 0x33, 0x33);
const SUBTITLE_GRAY: Rgb = Rgb(0x66, 0x66, 0x66);

/// Deck errors
#[derive(Debug, Error)]
pub(crate) enum DeckError {
    #[error("Failed to read capture {path}: {source}")]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save presentation: {0}")]
    Save(#[from] pptx::PptxError),
}

/// The session's presentation document.
pub(crate) struct SlideDeck {
    dir: PathBuf,
    settings: SlideSettings,
    path: PathBuf,
    slides: Vec<SlideContent>,
    media: Vec<MediaItem>,
    content_slides: u32,
}

impl SlideDeck {
    /// Start a new session deck in `dir` with a timestamped filename.
    ///
    /// Creates the title slide in memory; nothing is written to disk until
    /// the first append.
    pub(crate) fn start(dir: &Path, settings: &SlideSettings) -> Self {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("presentation_{}.pptx", timestamp));

        let deck = Self {
            dir: dir.to_path_buf(),
            settings: settings.clone(),
            path,
            slides: vec![title_slide(settings)],
            media: Vec::new(),
            content_slides: 0,
        };
        info!("New presentation session: {:?}", deck.path);
        deck
    }

    /// Append the two slides for an analyzed capture: the image slide and a
    /// notes slide with the summary and question. Saves before returning.
    pub(crate) fn append_analyzed(
        &mut self,
        artifact: &CaptureArtifact,
        analysis: &Analysis,
    ) -> Result<u32, DeckError> {
        self.content_slides += 1;
        let n = self.content_slides;
        let title = format!("Slide {}", n);

        let picture = self.embed_picture(artifact)?;
        let image_slide = SlideContent {
            shapes: vec![self.slide_title(&title), picture],
        };
        self.slides.push(image_slide);

        let notes_slide = SlideContent {
            shapes: vec![
                self.slide_title(&format!("{} - Notes", title)),
                self.notes_text(&analysis.summary, &analysis.question),
            ],
        };
        self.slides.push(notes_slide);

        self.save()?;
        info!(slide = n, "Content slides added (image + notes)");
        Ok(n)
    }

    /// Append a single image-only slide for a direct capture. Saves before
    /// returning.
    pub(crate) fn append_direct(&mut self, artifact: &CaptureArtifact) -> Result<u32, DeckError> {
        self.content_slides += 1;
        let n = self.content_slides;
        let title = format!("Slide {} (Direct Capture)", n);

        let picture = self.embed_picture(artifact)?;
        let slide = SlideContent {
            shapes: vec![self.slide_title(&title), picture],
        };
        self.slides.push(slide);

        self.save()?;
        info!(slide = n, "Direct capture slide added");
        Ok(n)
    }

    /// Path of the presentation file for this session.
    pub(crate) fn file_path(&self) -> &Path {
        &self.path
    }

    /// Number of content slides appended so far (title slide excluded).
    pub(crate) fn content_slides(&self) -> u32 {
        self.content_slides
    }

    /// Discard the current session and start a fresh deck with a new
    /// timestamped filename. The old file stays on disk.
    pub(crate) fn reset(&mut self) {
        *self = Self::start(&self.dir.clone(), &self.settings.clone());
    }

    fn embed_picture(&mut self, artifact: &CaptureArtifact) -> Result<Shape, DeckError> {
        let bytes = fs::read(&artifact.path).map_err(|e| DeckError::ReadImage {
            path: artifact.path.clone(),
            source: e,
        })?;
        let media_index = self.media.len();
        self.media.push(MediaItem {
            bytes,
            extension: artifact.format.extension().to_string(),
        });

        let rect = Rect::new(
            (self.settings.width_in - self.settings.image_width_in) / 2.0,
            1.0,
            self.settings.image_width_in,
            self.settings.image_height_in,
        );
        Ok(Shape::Picture { rect, media_index })
    }

    fn slide_title(&self, title: &str) -> Shape {
        Shape::TextBox {
            rect: Rect::new(0.3, 0.2, self.settings.width_in - 0.6, 0.6),
            word_wrap: false,
            paragraphs: vec![Paragraph {
                text: title.to_string(),
                size_pt: 24,
                bold: true,
                color: TITLE_DARK_BLUE,
                align: Align::Left,
                space_after_pt: None,
            }],
        }
    }

    fn notes_text(&self, summary: &str, question: &str) -> Shape {
        Shape::TextBox {
            rect: Rect::new(0.5, 1.0, self.settings.width_in - 1.0, 6.0),
            word_wrap: true,
            paragraphs: vec![
                Paragraph {
                    text: "Summary".to_string(),
                    size_pt: 24,
                    bold: true,
                    color: HEADING_BLUE,
                    align: Align::Left,
                    space_after_pt: Some(12),
                },
                Paragraph {
                    text: truncate_summary(summary),
                    size_pt: 16,
                    bold: false,
                    color: BODY_GRAY,
                    align: Align::Left,
                    space_after_pt: Some(24),
                },
                Paragraph {
                    text: "Multiple Choice Question".to_string(),
                    size_pt: 24,
                    bold: true,
                    color: HEADING_RED,
                    align: Align::Left,
                    space_after_pt: Some(12),
                },
                Paragraph {
                    text: question.to_string(),
                    size_pt: 16,
                    bold: false,
                    color: BODY_GRAY,
                    align: Align::Left,
                    space_after_pt: None,
                },
            ],
        }
    }

    fn save(&self) -> Result<(), DeckError> {
        pptx::write_package(
            &self.path,
            &self.slides,
            &self.media,
            self.settings.width_in,
            self.settings.height_in,
        )?;
        debug!("Presentation saved: {:?}", self.path);
        Ok(())
    }
}

fn title_slide(settings: &SlideSettings) -> SlideContent {
    let date = Local::now().format("%B %d, %Y");
    SlideContent {
        shapes: vec![
            Shape::TextBox {
                rect: Rect::new(0.5, 2.5, settings.width_in - 1.0, 1.5),
                word_wrap: false,
                paragraphs: vec![Paragraph {
                    text: "Educational Notes".to_string(),
                    size_pt: 44,
                    bold: true,
                    color: HEADING_BLUE,
                    align: Align::Center,
                    space_after_pt: None,
                }],
            },
            Shape::TextBox {
                rect: Rect::new(0.5, 4.0, settings.width_in - 1.0, 1.0),
                word_wrap: false,
                paragraphs: vec![Paragraph {
                    text: format!("Auto-generated - {}", date),
                    size_pt: 20,
                    bold: false,
                    color: SUBTITLE_GRAY,
                    align: Align::Center,
                    space_after_pt: None,
                }],
            },
        ],
    }
}

/// Cap the summary for display; longer text gets an ellipsis.
fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() > MAX_SUMMARY_CHARS {
        let truncated: String = summary.chars().take(MAX_SUMMARY_CHARS).collect();
        format!("{}...", truncated)
    } else {
        summary.to_string()
    }
}
