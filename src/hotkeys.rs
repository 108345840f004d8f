//! Global hotkey management
//!
//! Provides the two capture shortcuts. Hotkeys work even when the app is
//! in the background.

use crate::pipeline::Trigger;
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Initialize global hotkeys for the application
///
/// Registered hotkeys:
/// - Control + V: Capture with AI analysis
/// - Control + B: Direct capture (no AI)
pub(crate) fn init_hotkeys() -> Result<GlobalHotKeyManager, String> {
    let manager = GlobalHotKeyManager::new()
        .map_err(|e| format!("Failed to create hotkey manager: {}", e))?;

    manager
        .register(analyzed_hotkey())
        .map_err(|e| format!("Failed to register analyzed capture hotkey: {}", e))?;

    info!("Registered global hotkey: Control + V (capture with AI analysis)");

    manager
        .register(direct_hotkey())
        .map_err(|e| format!("Failed to register direct capture hotkey: {}", e))?;

    info!("Registered global hotkey: Control + B (direct capture)");

    Ok(manager)
}

/// Remove the global hotkeys at shutdown.
pub(crate) fn unregister_hotkeys(manager: &GlobalHotKeyManager) {
    for hotkey in [analyzed_hotkey(), direct_hotkey()] {
        if let Err(e) = manager.unregister(hotkey) {
            warn!("Failed to unregister hotkey: {}", e);
        }
    }
}

/// Control + V: capture with AI analysis
fn analyzed_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL), Code::KeyV)
}

/// Control + B: direct capture
fn direct_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL), Code::KeyB)
}

/// Map a hotkey event id to the trigger it stands for.
fn trigger_for_event(id: u32) -> Option<Trigger> {
    if id == analyzed_hotkey().id() {
        Some(Trigger::Analyzed)
    } else if id == direct_hotkey().id() {
        Some(Trigger::Direct)
    } else {
        None
    }
}

/// Start listening for hotkey events
///
/// This spawns a background thread (not a tokio task) that polls for
/// hotkey events and forwards triggers over the channel. Presses that
/// arrive while the channel is full are dropped; the pipeline enforces
/// single-run semantics anyway.
pub(crate) fn start_hotkey_listener(triggers: mpsc::Sender<Trigger>) {
    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();

        info!("Hotkey listener started on dedicated thread");

        loop {
            // Use try_recv with sleep to avoid blocking issues
            match receiver.try_recv() {
                Ok(event) => {
                    info!("Hotkey event received: {:?}", event);

                    // Only handle key press, ignore key release
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }

                    let Some(trigger) = trigger_for_event(event.id) else {
                        continue;
                    };

                    match triggers.try_send(trigger) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            warn!(?trigger, "Trigger queue full, hotkey press dropped");
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            info!("Trigger channel closed, hotkey listener stopping");
                            break;
                        }
                    }
                }
                Err(_) => {
                    // No event, sleep briefly to avoid busy-waiting
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzed_hotkey_maps_to_analyzed_trigger() {
        assert_eq!(
            trigger_for_event(analyzed_hotkey().id()),
            Some(Trigger::Analyzed)
        );
    }

    #[test]
    fn test_direct_hotkey_maps_to_direct_trigger() {
        assert_eq!(
            trigger_for_event(direct_hotkey().id()),
            Some(Trigger::Direct)
        );
    }

    #[test]
    fn test_unknown_event_id_maps_to_nothing() {
        let other = HotKey::new(Some(Modifiers::CONTROL), Code::KeyZ);
        assert_eq!(trigger_for_event(other.id()), None);
    }

    #[test]
    fn test_hotkey_ids_are_distinct() {
        assert_ne!(analyzed_hotkey().id(), direct_hotkey().id());
    }
}
