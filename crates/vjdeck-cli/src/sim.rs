//! Synthetic collaborators for headless dry runs
//!
//! A pulse-train capture source, a canned content provider, and
//! tracing-backed player/visibility sinks. Together they let the whole
//! deck run without a browser, a microphone, or the video API — useful
//! for tuning beat thresholds and watching the rotation behave.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rand::Rng;
use tracing::info;

use vjdeck::config::analysis::FFT_SIZE;
use vjdeck::config::player::STATE_PLAYING;
use vjdeck::content::{ContentItem, ContentProvider};
use vjdeck::error::Result;
use vjdeck::rotation::{DeckEvent, PlayerControl, SlotId, VisibilitySink};
use vjdeck::audio::CaptureSource;

/// Analysis blocks per second the synthetic source delivers
const BLOCK_RATE_HZ: u64 = 60;

/// How long a simulated load takes before the player reports playing
const SIM_LOAD_TIME: Duration = Duration::from_millis(400);

/// Generates kick-drum-like bass pulses at a fixed tempo
pub struct PulseCapture {
    bpm: u32,
    started: Option<Instant>,
    blocks_served: u64,
}

impl PulseCapture {
    pub fn new(bpm: u32) -> Self {
        Self {
            bpm,
            started: None,
            blocks_served: 0,
        }
    }
}

impl CaptureSource for PulseCapture {
    fn request_access(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_block(&mut self, buf: &mut [f32; FFT_SIZE]) -> Result<bool> {
        let started = *self.started.get_or_insert_with(Instant::now);

        // Pace ourselves to the analysis cadence
        let due = started + Duration::from_millis(self.blocks_served * 1000 / BLOCK_RATE_HZ);
        if let Some(wait) = due.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
        self.blocks_served += 1;

        let beat_period_ms = 60_000 / u64::from(self.bpm);
        let since_beat = started.elapsed().as_millis() as u64 % beat_period_ms;
        // A pulse burns hot for the first 80ms of each period
        let amplitude = if since_beat < 80 { 1.0 } else { 0.02 };

        let mut rng = rand::rng();
        for (i, sample) in buf.iter_mut().enumerate() {
            // Low-frequency body plus a little noise
            let phase = 2.0 * std::f32::consts::PI * 4.0 * i as f32 / FFT_SIZE as f32;
            *sample = amplitude * phase.sin() + rng.random_range(-0.01..0.01);
        }
        Ok(true)
    }

    fn stop(&mut self) {
        info!("synthetic capture stopped");
    }
}

/// Serves items from a fixed in-memory catalogue
pub struct CannedProvider {
    items: Vec<ContentItem>,
}

impl CannedProvider {
    pub fn new() -> Self {
        let items = ["kQ9n5Km46m4", "x7A2rT9qLc8", "p3ZvWb81Hd0", "mN6cYe24Rf2"]
            .into_iter()
            .map(|id| ContentItem {
                id: id.to_string(),
                duration_secs: Some(240.0),
            })
            .collect();
        Self { items }
    }
}

impl ContentProvider for CannedProvider {
    fn request(&self, theme: Option<&str>) -> Result<ContentItem> {
        let index = rand::rng().random_range(0..self.items.len());
        let item = self.items[index].clone();
        info!(
            "serving {} (theme: {})",
            item.id,
            theme.unwrap_or("unfiltered")
        );
        Ok(item)
    }
}

/// Logs player commands and reports "playing" back into the deck after
/// a simulated load time
pub struct SimPlayer {
    events: Sender<DeckEvent>,
}

impl SimPlayer {
    pub fn new(events: Sender<DeckEvent>) -> Arc<Self> {
        Arc::new(Self { events })
    }
}

impl PlayerControl for SimPlayer {
    fn load(&self, slot: SlotId, content_id: &str, start_secs: f32) -> Result<()> {
        info!("slot {slot}: loading {content_id} from {start_secs:.0}s");
        let events = self.events.clone();
        thread::spawn(move || {
            thread::sleep(SIM_LOAD_TIME);
            let _ = events.send(DeckEvent::PlayerStateChange {
                slot,
                code: STATE_PLAYING,
            });
        });
        Ok(())
    }

    fn set_playback_rate(&self, slot: SlotId, rate: f32) -> Result<()> {
        info!("slot {slot}: playback rate {rate}");
        Ok(())
    }
}

/// Logs visibility changes
pub struct SimVisibility;

impl VisibilitySink for SimVisibility {
    fn set_visible(&self, slot: SlotId, visible: bool) {
        if visible {
            info!("slot {slot}: ON AIR");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_capture_produces_bass_heavy_blocks_on_the_beat() {
        let mut capture = PulseCapture::new(120);
        let mut buf = [0.0_f32; FFT_SIZE];
        capture.request_access().unwrap();
        // First block lands inside the initial pulse window
        assert!(capture.next_block(&mut buf).unwrap());
        let peak = buf.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.5);
    }

    #[test]
    fn canned_provider_always_serves_an_item() {
        let provider = CannedProvider::new();
        for _ in 0..10 {
            let item = provider.request(Some("anything")).unwrap();
            assert!(!item.id.is_empty());
            assert_eq!(item.duration_secs, Some(240.0));
        }
    }

    #[test]
    fn sim_player_reports_playing_after_load() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let player = SimPlayer::new(tx);
        player.load(SlotId::Two, "abc", 10.0).unwrap();
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        match event {
            DeckEvent::PlayerStateChange { slot, code } => {
                assert_eq!(slot, SlotId::Two);
                assert_eq!(code, STATE_PLAYING);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
