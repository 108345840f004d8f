//! Audible feedback tones.
//!
//! Rodio's output stream is not `Send`, so playback lives on a dedicated
//! thread fed through a channel. Queuing a tone never blocks and never
//! fails outward; without an audio device the tones are dropped.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Feedback tone kinds, each with a fixed beep sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tone {
    /// A capture has started.
    Capture,
    /// A slide was appended.
    Success,
    /// The run failed.
    Error,
}

/// Beep sequence for a tone as (frequency in Hz, duration in ms) pairs.
fn beep_plan(tone: Tone) -> &'static [(u32, u64)] {
    match tone {
        Tone::Capture => &[(800, 150)],
        Tone::Success => &[(600, 100), (800, 100), (1000, 150)],
        Tone::Error => &[(300, 300)],
    }
}

/// Cloneable handle to the playback thread.
#[derive(Clone)]
pub(crate) struct SoundPlayer {
    tx: Sender<Tone>,
}

impl SoundPlayer {
    /// Start the playback thread and return a handle to it.
    pub(crate) fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<Tone>();
        let spawned = thread::Builder::new()
            .name("sound-player".to_string())
            .spawn(move || {
                // The stream handle must outlive every sink built from it.
                let Ok((_stream, handle)) = OutputStream::try_default() else {
                    warn!("No audio output device, feedback tones disabled");
                    while rx.recv().is_ok() {}
                    return;
                };

                while let Ok(tone) = rx.recv() {
                    let Ok(sink) = Sink::try_new(&handle) else {
                        debug!(?tone, "Audio sink unavailable, tone skipped");
                        continue;
                    };
                    for &(freq, ms) in beep_plan(tone) {
                        let beep = SineWave::new(freq as f32)
                            .take_duration(Duration::from_millis(ms))
                            .amplify(0.20);
                        sink.append(beep);
                    }
                    // Tones queue in the channel while one is sounding.
                    sink.sleep_until_end();
                }
            });
        if let Err(e) = spawned {
            warn!("Failed to start sound thread: {}", e);
        }
        Self { tx }
    }

    /// Queue a tone. Never blocks; failures are ignored.
    pub(crate) fn play(&self, tone: Tone) {
        let _ = self.tx.send(tone);
    }

    /// A player whose tones are recorded instead of rendered.
    #[cfg(test)]
    pub(crate) fn paired() -> (Self, mpsc::Receiver<Tone>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}
