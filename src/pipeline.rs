//! Capture pipeline orchestration.
//!
//! One trigger becomes one run: capture, optional analysis, deck append,
//! with tone feedback at each outcome. At most one run is in flight; a
//! trigger that arrives while a run is active is dropped with a warning,
//! never queued. The in-flight slot is released on every exit path,
//! including panics, which are caught at the task boundary.

use crate::analysis::Analysis;
use crate::capture::{CaptureArtifact, CaptureError};
use crate::deck::SlideDeck;
use crate::sound::{SoundPlayer, Tone};
use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Hotkey-initiated work kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// Capture, analyze with the vision model, append image + notes slides.
    Analyzed,
    /// Capture and append a single image slide, no model call.
    Direct,
}

/// Produces capture artifacts. Implemented by the screen capturer and by
/// test stubs.
pub(crate) trait CaptureSource: Send + Sync + 'static {
    fn capture(&self) -> Result<CaptureArtifact, CaptureError>;
}

/// Turns a capture into an [`Analysis`]. Implementations must not fail
/// outward; errors are reported through `Analysis::success`.
#[async_trait]
pub(crate) trait VisionAnalyzer: Send + Sync + 'static {
    async fn analyze(&self, artifact: &CaptureArtifact) -> Analysis;
}

/// Sequences capture, analysis, and deck updates for one session.
pub(crate) struct Pipeline<C, V> {
    capture: C,
    analyzer: V,
    deck: Mutex<SlideDeck>,
    sounds: SoundPlayer,
    busy: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the run ends, however it ends.
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl<C: CaptureSource, V: VisionAnalyzer> Pipeline<C, V> {
    pub(crate) fn new(capture: C, analyzer: V, deck: SlideDeck, sounds: SoundPlayer) -> Self {
        Self {
            capture,
            analyzer,
            deck: Mutex::new(deck),
            sounds,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Path of the session's presentation file.
    pub(crate) fn deck_path(&self) -> PathBuf {
        self.lock_deck().file_path().to_path_buf()
    }

    /// Start a run for `trigger` unless one is already in flight.
    ///
    /// The in-flight slot is taken synchronously, so a second trigger is
    /// rejected before this returns. Returns `None` when the trigger was
    /// dropped.
    pub(crate) fn spawn_run(self: &Arc<Self>, trigger: Trigger) -> Option<JoinHandle<()>> {
        let Some(guard) = RunGuard::acquire(&self.busy) else {
            warn!(
                ?trigger,
                "Previous operation still in progress, trigger dropped"
            );
            return None;
        };

        let pipeline = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(panic) = AssertUnwindSafe(pipeline.run(trigger)).catch_unwind().await {
                error!("Capture run panicked: {}", panic_message(&panic));
                pipeline.sounds.play(Tone::Error);
            }
        }))
    }

    /// Receive triggers and start runs without awaiting them, so a busy
    /// pipeline rejects the next trigger promptly.
    pub(crate) fn spawn_dispatcher(
        pipeline: Arc<Self>,
        mut triggers: mpsc::Receiver<Trigger>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(trigger) = triggers.recv().await {
                let _ = pipeline.spawn_run(trigger);
            }
            info!("Trigger channel closed, dispatcher stopping");
        })
    }

    async fn run(&self, trigger: Trigger) {
        match trigger {
            Trigger::Analyzed => self.run_analyzed().await,
            Trigger::Direct => self.run_direct().await,
        }
    }

    async fn run_analyzed(&self) {
        info!("New capture started (AI analysis)");
        self.sounds.play(Tone::Capture);

        let artifact = match self.capture.capture() {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("Failed to capture screenshot: {}", e);
                self.sounds.play(Tone::Error);
                return;
            }
        };

        info!("Analyzing with Gemini...");
        let analysis = self.analyzer.analyze(&artifact).await;
        if !analysis.success {
            // The capture file stays on disk; only the slides are skipped.
            error!("Gemini analysis failed: {}", analysis.summary);
            self.sounds.play(Tone::Error);
            return;
        }
        info!(
            summary_chars = analysis.summary.chars().count(),
            "Analysis complete"
        );

        let appended = self.lock_deck().append_analyzed(&artifact, &analysis);
        match appended {
            Ok(n) => {
                info!(slide = n, "Slide added");
                self.sounds.play(Tone::Success);
            }
            Err(e) => {
                error!("Failed to update presentation: {}", e);
                self.sounds.play(Tone::Error);
            }
        }
    }

    async fn run_direct(&self) {
        info!("Direct capture started");
        self.sounds.play(Tone::Capture);

        let artifact = match self.capture.capture() {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("Failed to capture screenshot: {}", e);
                self.sounds.play(Tone::Error);
                return;
            }
        };

        let appended = self.lock_deck().append_direct(&artifact);
        match appended {
            Ok(n) => {
                info!(slide = n, "Direct capture slide added");
                self.sounds.play(Tone::Success);
            }
            Err(e) => {
                error!("Failed to update presentation: {}", e);
                self.sounds.play(Tone::Error);
            }
        }
    }

    fn lock_deck(&self) -> MutexGuard<'_, SlideDeck> {
        // A poisoned lock still holds a usable deck: every save rewrites the
        // file in full, so the next append heals any half-finished state.
        match self.deck.lock() {
            Ok(deck) => deck,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
