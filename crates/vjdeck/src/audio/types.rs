//! Shared audio types
//!
//! Pure data types used across the audio subsystem.

use std::fmt;
use std::time::Instant;

/// Energy reductions for one analyzed audio frame
///
/// Produced once per analysis tick and consumed immediately; nothing
/// retains it beyond the tick except the detector's last-beat bookkeeping.
/// All energy fields carry integral values (rounded at the analyzer).
#[derive(Debug, Clone, Copy)]
pub struct FrameMetrics {
    /// Sum of all bin levels
    pub total_energy: f32,
    /// Mean bin level
    pub average_energy: f32,
    /// Highest single bin level
    pub max_energy: f32,
    /// Sum over the low-frequency bins
    pub bass_energy: f32,
    /// Mean over the low-frequency bins
    pub bass_average: f32,
    /// When the frame was analyzed
    pub timestamp: Instant,
}

/// A detected beat
#[derive(Debug, Clone, Copy)]
pub struct BeatEvent {
    pub timestamp: Instant,
    /// Total energy of the triggering frame
    pub energy: f32,
    /// Bass energy of the triggering frame
    pub bass_energy: f32,
    /// Detection confidence, always within 0.0..=1.0
    pub confidence: f32,
}

impl fmt::Display for BeatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "beat energy={} bass={} confidence={:.2}",
            self.energy, self.bass_energy, self.confidence
        )
    }
}

/// Capture subsystem status for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureStatus {
    pub listening: bool,
    pub has_access: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beat_event_display_shows_energies_and_confidence() {
        let beat = BeatEvent {
            timestamp: Instant::now(),
            energy: 2000.0,
            bass_energy: 600.0,
            confidence: 1.0,
        };
        assert_eq!(beat.to_string(), "beat energy=2000 bass=600 confidence=1.00");
    }

    #[test]
    fn capture_status_default_is_inactive() {
        let status = CaptureStatus::default();
        assert!(!status.listening);
        assert!(!status.has_access);
    }

    #[test]
    fn frame_metrics_is_copy() {
        let m = FrameMetrics {
            total_energy: 1.0,
            average_energy: 1.0,
            max_energy: 1.0,
            bass_energy: 1.0,
            bass_average: 1.0,
            timestamp: Instant::now(),
        };
        let copied = m;
        assert_eq!(copied.total_energy, m.total_energy);
    }
}
