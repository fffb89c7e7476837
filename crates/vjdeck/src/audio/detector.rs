//! Beat detector
//!
//! Stateful threshold classifier over the frame-metrics stream. Frames
//! are processed one at a time in arrival order; the only state carried
//! across calls is the timestamp of the last accepted beat, which
//! enforces the cooldown window. Performs no I/O and cannot fail;
//! threshold sanity is the caller's responsibility
//! ([`DeckConfig::validate`](crate::config::DeckConfig::validate)).

use std::time::{Duration, Instant};

use crate::config::BeatConfig;

use super::types::{BeatEvent, FrameMetrics};

/// Fraction of the energy threshold the frame average must exceed for
/// the significant-beat qualification
const SIGNIFICANT_AVERAGE_RATIO: f32 = 0.7;

/// Turns frame metrics into discrete, confidence-scored beat events
#[derive(Debug)]
pub struct BeatDetector {
    config: BeatConfig,
    last_beat: Option<Instant>,
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            config,
            last_beat: None,
        }
    }

    /// Classify one frame. Returns a beat at most once per cooldown
    /// window; `last_beat` advances only when an event is emitted.
    pub fn process(&mut self, metrics: &FrameMetrics) -> Option<BeatEvent> {
        let now = metrics.timestamp;
        if let Some(last) = self.last_beat {
            let cooldown = Duration::from_millis(self.config.beat_cooldown_ms);
            if now.duration_since(last) < cooldown {
                return None;
            }
        }

        if !self.is_candidate(metrics) {
            return None;
        }

        let confidence = self.confidence(metrics);
        if confidence < self.config.confidence_threshold {
            return None;
        }

        self.last_beat = Some(now);
        Some(BeatEvent {
            timestamp: now,
            energy: metrics.total_energy,
            bass_energy: metrics.bass_energy,
            confidence,
        })
    }

    fn is_candidate(&self, m: &FrameMetrics) -> bool {
        let has_high_energy = m.total_energy > self.config.energy_threshold;
        let has_strong_bass = m.bass_energy > self.config.bass_threshold;
        let is_significant =
            m.average_energy > self.config.energy_threshold * SIGNIFICANT_AVERAGE_RATIO;
        has_high_energy && (has_strong_bass || is_significant)
    }

    /// Average of the clamped threshold-excess ratios
    fn confidence(&self, m: &FrameMetrics) -> f32 {
        let energy_excess = clamp01(
            (m.total_energy - self.config.energy_threshold) / self.config.energy_threshold,
        );
        let bass_excess =
            clamp01((m.bass_energy - self.config.bass_threshold) / self.config.bass_threshold);
        (energy_excess + bass_excess) / 2.0
    }
}

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}
