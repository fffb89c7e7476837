//! Configuration for the vjdeck engine
//!
//! Fixed tuning constants live in the `analysis` and `player` modules;
//! user-facing knobs live in [`DeckConfig`], loadable from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};

/// Audio analysis configuration
pub mod analysis {
    /// FFT window size for the energy analyzer
    pub const FFT_SIZE: usize = 256;

    /// Number of frequency bins produced per frame (FFT_SIZE / 2)
    pub const BIN_COUNT: usize = 128;

    /// Bins counted as "bass" (the low end of the spectrum)
    pub const BASS_BINS: usize = 20;

    /// Per-bin exponential smoothing factor (0.0-1.0, higher = smoother)
    pub const BIN_SMOOTHING: f32 = 0.8;

    /// Ceiling for a single bin level after scaling
    pub const BIN_CEILING: f32 = 255.0;
}

/// External player protocol constants
pub mod player {
    /// State code reported by the player when content is actively
    /// playing; the scheduler treats it as the load-completion signal.
    pub const STATE_PLAYING: i32 = 1;

    /// Margin kept from both ends when seeking into known-duration content (seconds)
    pub const START_OFFSET_MARGIN_SECS: f32 = 5.0;

    /// Start offset range for unknown-duration content (seconds)
    pub const FALLBACK_START_MIN_SECS: f32 = 2.0;
    pub const FALLBACK_START_MAX_SECS: f32 = 60.0;
}

/// Beat detection thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeatConfig {
    /// Minimum total energy for a frame to qualify as a beat candidate
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f32,

    /// Minimum bass energy for the strong-bass qualification
    #[serde(default = "default_bass_threshold")]
    pub bass_threshold: f32,

    /// Minimum spacing between accepted beats (milliseconds)
    #[serde(default = "default_beat_cooldown_ms")]
    pub beat_cooldown_ms: u64,

    /// Minimum confidence (0.0-1.0) for a candidate to be emitted
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            energy_threshold: default_energy_threshold(),
            bass_threshold: default_bass_threshold(),
            beat_cooldown_ms: default_beat_cooldown_ms(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub beat: BeatConfig,

    /// Period of the content-refresh timer (seconds)
    #[serde(default = "default_rotation_interval")]
    pub rotation_interval_secs: f32,

    /// Grace period between a slot reporting ready and the natural
    /// switch to it, letting player chrome settle (seconds)
    #[serde(default = "default_switch_delay")]
    pub switch_delay_secs: f32,

    /// Playback rate applied to every loaded item
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f32,

    /// Themes to rotate through; empty means unfiltered requests
    #[serde(default)]
    pub themes: Vec<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            beat: BeatConfig::default(),
            rotation_interval_secs: default_rotation_interval(),
            switch_delay_secs: default_switch_delay(),
            playback_rate: default_playback_rate(),
            themes: Vec::new(),
        }
    }
}

impl DeckConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| DeckError::Config(format!("{}: {e}", path.display())))?;
        let config: DeckConfig = serde_json::from_str(&data)
            .map_err(|e| DeckError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the values the core algorithms assume.
    ///
    /// The beat detector divides by both thresholds when scoring
    /// confidence and performs no guarding of its own, so non-positive
    /// thresholds are rejected here.
    pub fn validate(&self) -> Result<()> {
        if self.beat.energy_threshold <= 0.0 {
            return Err(DeckError::Config(
                "beat.energy_threshold must be positive".to_string(),
            ));
        }
        if self.beat.bass_threshold <= 0.0 {
            return Err(DeckError::Config(
                "beat.bass_threshold must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.beat.confidence_threshold) {
            return Err(DeckError::Config(
                "beat.confidence_threshold must be within 0.0..=1.0".to_string(),
            ));
        }
        if self.rotation_interval_secs <= 0.0 {
            return Err(DeckError::Config(
                "rotation_interval_secs must be positive".to_string(),
            ));
        }
        if self.switch_delay_secs < 0.0 {
            return Err(DeckError::Config(
                "switch_delay_secs must not be negative".to_string(),
            ));
        }
        if self.playback_rate <= 0.0 {
            return Err(DeckError::Config(
                "playback_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_energy_threshold() -> f32 {
    1000.0
}

fn default_bass_threshold() -> f32 {
    300.0
}

fn default_beat_cooldown_ms() -> u64 {
    300
}

fn default_confidence_threshold() -> f32 {
    0.3
}

fn default_rotation_interval() -> f32 {
    8.0
}

fn default_switch_delay() -> f32 {
    2.0
}

fn default_playback_rate() -> f32 {
    0.25
}
