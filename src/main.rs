#![deny(clippy::all)]

mod analysis;
mod capture;
mod config;
mod deck;
mod error;
mod gemini;
mod hotkeys;
mod pipeline;
mod sound;

use crate::capture::{CaptureFormat, ScreenCapturer};
use crate::deck::{export, SlideDeck};
use crate::error::AppError;
use crate::gemini::GeminiClient;
use crate::pipeline::Pipeline;
use crate::sound::{SoundPlayer, Tone};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Hotkey presses waiting for the dispatcher. Small on purpose: the
/// pipeline drops overlapping work anyway.
const TRIGGER_QUEUE_CAPACITY: usize = 8;

/// Prints the application banner.
fn print_banner() {
    let banner = r#"
+===============================================================+
|                                                               |
|        EDUCATIONAL SLIDE AUTOMATION APPLICATION               |
|                                                               |
|   Automatically creates educational slides from video content |
|                                                               |
+===============================================================+
|                                                               |
|   Ctrl+V  : Capture with AI analysis (summary + question)     |
|   Ctrl+B  : Direct capture (screenshot only, no AI)           |
|   Ctrl+C  : Close the application                             |
|                                                               |
+===============================================================+
"#;
    println!("{}", banner);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    print_banner();

    info!("Checking configuration...");
    let settings = config::Settings::load()?;
    let api_key = match config::gemini_api_key() {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            error!("Please create a .env file and set GEMINI_API_KEY.");
            error!("Example: GEMINI_API_KEY=your_api_key_here");
            return Err(e.into());
        }
    };
    info!("Configuration valid.");

    let dirs = config::OutputDirs::ensure()?;
    capture::cleanup_old_screenshots(&dirs.screenshots, settings.capture.retention_days);

    let deck = SlideDeck::start(&dirs.presentations, &settings.slides);
    info!("Presentation file: {}", deck.file_path().display());

    let sounds = SoundPlayer::spawn();
    let capturer = ScreenCapturer::new(
        &dirs.screenshots,
        CaptureFormat::from_name(&settings.capture.format),
        settings.capture.jpeg_quality,
    );
    let analyzer = GeminiClient::new(api_key, &settings.gemini.model)?;
    let pipeline = Arc::new(Pipeline::new(capturer, analyzer, deck, sounds.clone()));

    // Initialize global hotkeys
    let hotkey_manager = hotkeys::init_hotkeys().map_err(AppError::Hotkey)?;
    info!("CTRL+V and CTRL+B hotkeys active!");

    let (triggers_tx, triggers_rx) = mpsc::channel(TRIGGER_QUEUE_CAPACITY);
    hotkeys::start_hotkey_listener(triggers_tx);
    let _dispatcher = Pipeline::spawn_dispatcher(Arc::clone(&pipeline), triggers_rx);

    println!("\n{}", "=".repeat(60));
    println!("Application ready!");
    println!("  Ctrl+V = Capture with AI analysis");
    println!("  Ctrl+B = Direct capture (no AI)");
    println!("{}\n", "=".repeat(60));

    // Startup chime
    sounds.play(Tone::Success);

    tokio::signal::ctrl_c().await?;
    info!("Closing application...");

    hotkeys::unregister_hotkeys(&hotkey_manager);
    info!("Hotkeys removed.");

    println!("\nExporting presentation to PDF...");
    info!("Exporting presentation to PDF...");
    let deck_path = pipeline.deck_path();
    match export::export_to_pdf(&deck_path).await {
        Ok(pdf) => {
            info!("PDF exported: {}", pdf.display());
            println!("PDF saved: {}", pdf.display());
        }
        Err(e) => {
            warn!("PDF export failed or skipped: {}", e);
            println!("PDF export failed (PowerPoint may not be installed).");
        }
    }

    info!("Created presentation: {}", deck_path.display());
    println!("\nPresentation saved: {}", deck_path.display());
    println!("Application closed successfully. Goodbye!");

    Ok(())
}
