//! Deck facade
//!
//! [`VjDeck`] wires the audio side (capture, analysis, beat detection)
//! to the rotation scheduler and owns both threads. The host keeps a
//! [`Sender`] for injecting player-protocol events and tears everything
//! down through [`VjDeck::stop`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use tracing::{info, warn};

use crate::audio::{AudioListener, CaptureSource};
use crate::config::DeckConfig;
use crate::content::ContentProvider;
use crate::error::{DeckError, Result};
use crate::rotation::scheduler::BeatSwitchCallback;
use crate::rotation::{DeckEvent, PlayerControl, RotationScheduler, VisibilitySink};

/// Event queue capacity; beats and player events are both low-rate
const EVENT_QUEUE_SIZE: usize = 64;

/// External collaborators handed to [`VjDeck::start`]
pub struct DeckParts {
    pub capture: Box<dyn CaptureSource>,
    pub provider: Arc<dyn ContentProvider>,
    pub player: Arc<dyn PlayerControl>,
    pub visibility: Arc<dyn VisibilitySink>,
    /// Invoked after every beat-triggered switch, with the slot that
    /// became visible
    pub on_beat_switch: Option<BeatSwitchCallback>,
}

/// Running deck: a rotation scheduler thread plus, when the microphone
/// is available, a beat listener thread
pub struct VjDeck {
    event_tx: Sender<DeckEvent>,
    scheduler_thread: Option<JoinHandle<()>>,
    listener: Option<AudioListener>,
}

impl VjDeck {
    /// Validate the configuration and start the deck.
    ///
    /// A denied or absent microphone is not fatal: it disables
    /// beat-triggered switching and is reported on the diagnostic
    /// channel, while timer-driven rotation runs normally.
    pub fn start(config: DeckConfig, parts: DeckParts) -> Result<Self> {
        config.validate()?;

        let (event_tx, event_rx) = bounded::<DeckEvent>(EVENT_QUEUE_SIZE);

        let mut scheduler = RotationScheduler::new(
            config.clone(),
            parts.provider,
            parts.player,
            parts.visibility,
            event_tx.clone(),
            parts.on_beat_switch,
        );
        let scheduler_thread = thread::Builder::new()
            .name("rotation".to_string())
            .spawn(move || scheduler.run(&event_rx))
            .map_err(|e| DeckError::Capture(format!("spawn failed: {e}")))?;

        let beat_tx = event_tx.clone();
        let listener = match AudioListener::start(
            parts.capture,
            config.beat,
            None,
            Box::new(move |beat| {
                let _ = beat_tx.send(DeckEvent::Beat(beat));
            }),
        ) {
            Ok(listener) => Some(listener),
            Err(e @ (DeckError::PermissionDenied | DeckError::DeviceAbsent)) => {
                warn!("beat switching disabled: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        info!(
            "deck started (beat detection {})",
            if listener.is_some() { "on" } else { "off" }
        );
        Ok(Self {
            event_tx,
            scheduler_thread: Some(scheduler_thread),
            listener,
        })
    }

    /// Sender for injecting player-protocol events (`PlayerReady`,
    /// `PlayerStateChange`) from the host
    pub fn events(&self) -> Sender<DeckEvent> {
        self.event_tx.clone()
    }

    /// Whether the beat path is active
    pub fn beat_detection_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Stop the deck: release the capture device, then shut the
    /// scheduler down and join both threads.
    pub fn stop(mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.stop();
        }
        let _ = self.event_tx.send(DeckEvent::Shutdown);
        if let Some(handle) = self.scheduler_thread.take() {
            let _ = handle.join();
        }
        info!("deck stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::analysis::FFT_SIZE;
    use crate::content::ContentItem;
    use crate::rotation::SlotId;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct SilentCapture {
        denied: bool,
    }

    impl CaptureSource for SilentCapture {
        fn request_access(&mut self) -> Result<()> {
            if self.denied {
                Err(DeckError::PermissionDenied)
            } else {
                Ok(())
            }
        }

        fn next_block(&mut self, buf: &mut [f32; FFT_SIZE]) -> Result<bool> {
            buf.fill(0.0);
            thread::sleep(Duration::from_millis(1));
            Ok(true)
        }

        fn stop(&mut self) {}
    }

    struct StaticProvider;

    impl ContentProvider for StaticProvider {
        fn request(&self, _theme: Option<&str>) -> Result<ContentItem> {
            Ok(ContentItem {
                id: "item".to_string(),
                duration_secs: None,
            })
        }
    }

    #[derive(Default)]
    struct RecordingPlayer {
        loads: Mutex<Vec<SlotId>>,
    }

    impl PlayerControl for RecordingPlayer {
        fn load(&self, slot: SlotId, _content_id: &str, _start_secs: f32) -> Result<()> {
            self.loads.lock().unwrap().push(slot);
            Ok(())
        }

        fn set_playback_rate(&self, _slot: SlotId, _rate: f32) -> Result<()> {
            Ok(())
        }
    }

    struct NullVisibility;

    impl VisibilitySink for NullVisibility {
        fn set_visible(&self, _slot: SlotId, _visible: bool) {}
    }

    fn parts(denied: bool, player: Arc<RecordingPlayer>) -> DeckParts {
        DeckParts {
            capture: Box::new(SilentCapture { denied }),
            provider: Arc::new(StaticProvider),
            player,
            visibility: Arc::new(NullVisibility),
            on_beat_switch: None,
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_startup() {
        let mut config = DeckConfig::default();
        config.beat.energy_threshold = -1.0;
        let player = Arc::new(RecordingPlayer::default());
        assert!(VjDeck::start(config, parts(false, player)).is_err());
    }

    #[test]
    fn denied_microphone_degrades_to_timer_only() {
        let player = Arc::new(RecordingPlayer::default());
        let deck = VjDeck::start(DeckConfig::default(), parts(true, player.clone())).unwrap();
        assert!(!deck.beat_detection_active());

        // Rotation still works: the scheduler accepts player events and
        // issues warm-up loads.
        let events = deck.events();
        for slot in SlotId::ALL {
            events.send(DeckEvent::PlayerReady(slot)).unwrap();
        }
        for _ in 0..200 {
            if player.loads.lock().unwrap().len() >= 2 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let loads = player.loads.lock().unwrap().clone();
        assert!(loads.contains(&SlotId::One));
        assert!(loads.contains(&SlotId::Two));
        deck.stop();
    }

    #[test]
    fn granted_microphone_enables_beat_detection() {
        let player = Arc::new(RecordingPlayer::default());
        let deck = VjDeck::start(DeckConfig::default(), parts(false, player)).unwrap();
        assert!(deck.beat_detection_active());
        deck.stop();
    }

    #[test]
    fn stop_joins_cleanly() {
        static STOPPED: AtomicBool = AtomicBool::new(false);

        struct ReleasingCapture;
        impl CaptureSource for ReleasingCapture {
            fn request_access(&mut self) -> Result<()> {
                Ok(())
            }
            fn next_block(&mut self, buf: &mut [f32; FFT_SIZE]) -> Result<bool> {
                buf.fill(0.0);
                thread::sleep(Duration::from_millis(1));
                Ok(true)
            }
            fn stop(&mut self) {
                STOPPED.store(true, Ordering::Relaxed);
            }
        }

        let player = Arc::new(RecordingPlayer::default());
        let deck = VjDeck::start(
            DeckConfig::default(),
            DeckParts {
                capture: Box::new(ReleasingCapture),
                provider: Arc::new(StaticProvider),
                player,
                visibility: Arc::new(NullVisibility),
                on_beat_switch: None,
            },
        )
        .unwrap();
        deck.stop();
        assert!(STOPPED.load(Ordering::Relaxed));
    }
}
